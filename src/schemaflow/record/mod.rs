//! Records and sequences, the two data shapes the engine operates on.
//!
//! A [`Record`] is a positional list of values whose order and types are
//! described by a [`Schema`](crate::Schema). A [`Sequence`] is the ordered
//! list of records belonging to one entity, e.g. the time series of a single
//! sensor. Sequence order is guaranteed by the caller; the engine never
//! re-sorts.

pub mod value;

pub use value::Value;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single record: one value per schema column, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new() -> Self {
        Record { values: Vec::new() }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Record { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record { values }
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Record {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, "]")
    }
}

/// One entity's time-ordered records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    records: Vec<Record>,
}

impl Sequence {
    pub fn new() -> Self {
        Sequence {
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for Sequence {
    fn from(records: Vec<Record>) -> Self {
        Sequence { records }
    }
}

impl FromIterator<Record> for Sequence {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Sequence {
            records: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sequence({} steps)", self.records.len())?;
        for record in &self.records {
            writeln!(f, "  {}", record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_value_order() {
        let mut record = Record::new();
        record.push(Value::Integer(1));
        record.push(Value::String("a".to_string()));
        assert_eq!(record.len(), 2);
        assert_eq!(record.get(0), Some(&Value::Integer(1)));
        assert_eq!(record.get(2), None);
        assert_eq!(record.to_string(), "[1, a]");
    }

    #[test]
    fn test_record_round_trips_through_json_as_a_plain_array() {
        let record = Record::from(vec![Value::Long(9), Value::Boolean(false)]);
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
        // transparent wrapper: the wire shape is the value list itself
        assert!(json.starts_with('['));
    }

    #[test]
    fn test_sequence_collects_records_in_order() {
        let sequence: Sequence = (0..3)
            .map(|i| Record::from(vec![Value::Integer(i)]))
            .collect();
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.get(1), Some(&Record::from(vec![Value::Integer(1)])));
    }
}
