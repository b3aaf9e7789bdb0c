//! Schemas describe the columns of a record stream.
//!
//! A [`Schema`] is an immutable value object: once constructed it never
//! changes, and every transform derives structurally new schemas instead of
//! mutating existing ones. Construction fails if two columns share a name.

pub mod column;

pub use column::{ColumnDef, ColumnType};

use std::fmt;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::schemaflow::error::{SchemaError, ShapeError};
use crate::schemaflow::record::{Record, Sequence, Value};

/// Whether a schema describes independent records or ordered sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Independent records with no ordering between them.
    Standard,
    /// Each entity owns an ordered list of records (a time series).
    Sequence,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Standard => write!(f, "standard"),
            SchemaKind::Sequence => write!(f, "sequence"),
        }
    }
}

/// An ordered, immutable set of column definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    kind: SchemaKind,
    columns: Vec<ColumnDef>,
}

/// Wire shape of a schema, revalidated on deserialization so that invalid
/// schemas cannot enter through JSON.
#[derive(Deserialize)]
struct RawSchema {
    kind: SchemaKind,
    columns: Vec<ColumnDef>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        Schema::checked(raw.kind, raw.columns)
    }
}

impl Schema {
    fn checked(kind: SchemaKind, columns: Vec<ColumnDef>) -> Result<Self, SchemaError> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name() == column.name()) {
                return Err(SchemaError::DuplicateColumn {
                    name: column.name().to_string(),
                });
            }
        }
        Ok(Schema { kind, columns })
    }

    /// A standard (non-sequence) schema over the given columns.
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self, SchemaError> {
        Self::checked(SchemaKind::Standard, columns)
    }

    /// A sequence schema over the given columns.
    pub fn new_sequence(columns: Vec<ColumnDef>) -> Result<Self, SchemaError> {
        Self::checked(SchemaKind::Sequence, columns)
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Derive a structurally new schema of the same kind over different
    /// columns. The receiver is never mutated.
    pub fn with_columns(&self, columns: Vec<ColumnDef>) -> Result<Self, SchemaError> {
        Self::checked(self.kind, columns)
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == SchemaKind::Sequence
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    pub fn column_named(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Validate a record against this schema: the value count must equal the
    /// column count, every value must match its column's type, and `Null` is
    /// only allowed in nullable columns.
    pub fn validate(&self, record: &Record) -> Result<(), ShapeError> {
        if record.len() != self.columns.len() {
            return Err(ShapeError::ArityMismatch {
                expected: self.columns.len(),
                actual: record.len(),
            });
        }
        for (column, value) in self.columns.iter().zip(record.values()) {
            if matches!(value, Value::Null) {
                if !column.is_nullable() {
                    return Err(ShapeError::NullValue {
                        column: column.name().to_string(),
                    });
                }
                continue;
            }
            if !column.column_type().matches(value) {
                return Err(ShapeError::TypeMismatch {
                    column: column.name().to_string(),
                    expected: column.column_type().type_name().to_string(),
                    actual: value.type_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate every record of a sequence against this schema.
    pub fn validate_sequence(&self, sequence: &Sequence) -> Result<(), ShapeError> {
        for record in sequence.iter() {
            self.validate(record)?;
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} schema {{", self.kind)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", column)?;
        }
        write!(f, "}}")
    }
}

/// Builder with one typed adder per column type.
#[derive(Debug, Default, Clone)]
pub struct SchemaBuilder {
    columns: Vec<ColumnDef>,
}

impl SchemaBuilder {
    pub fn integer(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, ColumnType::Integer));
        self
    }

    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, ColumnType::Long));
        self
    }

    pub fn double(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, ColumnType::Double));
        self
    }

    pub fn boolean(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, ColumnType::Boolean));
        self
    }

    pub fn string(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, ColumnType::String));
        self
    }

    pub fn bytes(mut self, name: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::new(name, ColumnType::Bytes));
        self
    }

    pub fn time(mut self, name: impl Into<String>, timezone: Tz) -> Self {
        self.columns
            .push(ColumnDef::new(name, ColumnType::Time { timezone }));
        self
    }

    /// Add a fully specified column, e.g. a nullable one.
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::new(self.columns)
    }

    pub fn build_sequence(self) -> Result<Schema, SchemaError> {
        Schema::new_sequence(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor_schema() -> Schema {
        Schema::builder()
            .string("sensor")
            .double("reading")
            .column(ColumnDef::nullable("note", ColumnType::String))
            .build()
            .unwrap()
    }

    #[test]
    fn test_duplicate_column_names_are_rejected() {
        let err = Schema::builder()
            .long("id")
            .string("id")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateColumn {
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_by_name_and_index() {
        let schema = sensor_schema();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.column_index("reading"), Some(1));
        assert!(schema.has_column("note"));
        assert!(!schema.has_column("missing"));
        assert_eq!(schema.column_names(), vec!["sensor", "reading", "note"]);
        assert_eq!(
            schema.column_named("reading").map(|c| c.column_type()),
            Some(ColumnType::Double)
        );
    }

    #[test]
    fn test_with_columns_preserves_the_kind() {
        let sequence = Schema::builder()
            .time("ts", Tz::UTC)
            .build_sequence()
            .unwrap();
        let derived = sequence
            .with_columns(vec![ColumnDef::new("other", ColumnType::Long)])
            .unwrap();
        assert!(derived.is_sequence());
        assert_eq!(derived.column_names(), vec!["other"]);
        // the source schema is untouched
        assert_eq!(sequence.column_names(), vec!["ts"]);
    }

    #[test]
    fn test_validate_accepts_conforming_records() {
        let schema = sensor_schema();
        let record = Record::from(vec![
            Value::String("s-1".to_string()),
            Value::Double(20.1),
            Value::Null,
        ]);
        assert!(schema.validate(&record).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_arity() {
        let schema = sensor_schema();
        let record = Record::from(vec![Value::String("s-1".to_string())]);
        assert_eq!(
            schema.validate(&record),
            Err(ShapeError::ArityMismatch {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_validate_rejects_type_mismatches() {
        let schema = sensor_schema();
        let record = Record::from(vec![
            Value::String("s-1".to_string()),
            Value::Long(20),
            Value::Null,
        ]);
        assert_eq!(
            schema.validate(&record),
            Err(ShapeError::TypeMismatch {
                column: "reading".to_string(),
                expected: "DOUBLE".to_string(),
                actual: "LONG".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_null_in_non_nullable_columns() {
        let schema = sensor_schema();
        let record = Record::from(vec![Value::Null, Value::Double(1.0), Value::Null]);
        assert_eq!(
            schema.validate(&record),
            Err(ShapeError::NullValue {
                column: "sensor".to_string()
            })
        );
    }

    #[test]
    fn test_json_round_trip_revalidates() {
        let schema = sensor_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);

        // hand-built JSON with a duplicate name is rejected on the way in
        let bad = r#"{
            "kind": "standard",
            "columns": [
                {"name": "x", "type": "long"},
                {"name": "x", "type": "string"}
            ]
        }"#;
        assert!(serde_json::from_str::<Schema>(bad).is_err());
    }
}
