//! JSON record codec implementation.

use serde_json::Value as JsonValue;

use crate::schemaflow::record::{Record, Value};
use crate::schemaflow::schema::{ColumnDef, ColumnType, Schema};

use super::{RecordCodec, SerializationError};

/// JSON implementation of [`RecordCodec`].
///
/// A record is serialized as a flat JSON array with one element per schema
/// column: `Integer`, `Long` and `Time` as numbers (`Time` as epoch
/// milliseconds), `Double` as a number, `Boolean` as a bool, `String` as a
/// string, `Bytes` as an array of byte numbers and nulls only in nullable
/// columns. The schema makes the positional format self-sufficient: on the
/// way back in each element is interpreted by the column at its position,
/// which also restores `Time` zones.
#[derive(Debug, Clone)]
pub struct JsonRecordCodec {
    schema: Schema,
}

impl JsonRecordCodec {
    pub fn new(schema: Schema) -> Self {
        JsonRecordCodec { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl RecordCodec for JsonRecordCodec {
    fn serialize_record(&self, record: &Record) -> Result<Vec<u8>, SerializationError> {
        if record.len() != self.schema.len() {
            return Err(SerializationError::ArityMismatch {
                expected: self.schema.len(),
                actual: record.len(),
            });
        }
        let mut elements = Vec::with_capacity(record.len());
        for (column, value) in self.schema.columns().iter().zip(record.values()) {
            elements.push(value_to_json(column, value)?);
        }
        Ok(serde_json::to_vec(&elements)?)
    }

    fn deserialize_record(&self, bytes: &[u8]) -> Result<Record, SerializationError> {
        let elements: Vec<JsonValue> = serde_json::from_slice(bytes)?;
        if elements.len() != self.schema.len() {
            return Err(SerializationError::ArityMismatch {
                expected: self.schema.len(),
                actual: elements.len(),
            });
        }
        let mut values = Vec::with_capacity(elements.len());
        for (column, element) in self.schema.columns().iter().zip(&elements) {
            values.push(json_to_value(column, element)?);
        }
        Ok(Record::from(values))
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

fn mismatch(column: &ColumnDef) -> SerializationError {
    SerializationError::type_mismatch(column.name(), column.column_type().type_name())
}

fn value_to_json(column: &ColumnDef, value: &Value) -> Result<JsonValue, SerializationError> {
    if let Value::Null = value {
        return if column.is_nullable() {
            Ok(JsonValue::Null)
        } else {
            Err(mismatch(column))
        };
    }
    match (column.column_type(), value) {
        (ColumnType::Integer, Value::Integer(i)) => Ok(JsonValue::from(*i)),
        (ColumnType::Long, Value::Long(l)) => Ok(JsonValue::from(*l)),
        (ColumnType::Double, Value::Double(d)) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .ok_or_else(|| {
                SerializationError::unsupported_value(
                    column.name(),
                    format!("non-finite double {}", d),
                )
            }),
        (ColumnType::Boolean, Value::Boolean(b)) => Ok(JsonValue::Bool(*b)),
        (ColumnType::String, Value::String(s)) => Ok(JsonValue::String(s.clone())),
        (ColumnType::Bytes, Value::Bytes(bytes)) => Ok(JsonValue::Array(
            bytes.iter().map(|&b| JsonValue::from(b)).collect(),
        )),
        // the zone is schema metadata, only the instant goes on the wire
        (ColumnType::Time { .. }, Value::Time(millis, _)) => Ok(JsonValue::from(*millis)),
        _ => Err(mismatch(column)),
    }
}

fn json_to_value(column: &ColumnDef, json: &JsonValue) -> Result<Value, SerializationError> {
    if json.is_null() {
        return if column.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(mismatch(column))
        };
    }
    match column.column_type() {
        ColumnType::Integer => {
            let wide = json.as_i64().ok_or_else(|| mismatch(column))?;
            let narrow = i32::try_from(wide).map_err(|_| mismatch(column))?;
            Ok(Value::Integer(narrow))
        }
        ColumnType::Long => json.as_i64().map(Value::Long).ok_or_else(|| mismatch(column)),
        ColumnType::Double => json
            .as_f64()
            .map(Value::Double)
            .ok_or_else(|| mismatch(column)),
        ColumnType::Boolean => json
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| mismatch(column)),
        ColumnType::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| mismatch(column)),
        ColumnType::Bytes => {
            let elements = json.as_array().ok_or_else(|| mismatch(column))?;
            let mut bytes = Vec::with_capacity(elements.len());
            for element in elements {
                let wide = element.as_u64().ok_or_else(|| mismatch(column))?;
                let byte = u8::try_from(wide).map_err(|_| {
                    SerializationError::invalid_data(format!(
                        "byte value {} out of range in column \"{}\"",
                        wide,
                        column.name()
                    ))
                })?;
                bytes.push(byte);
            }
            Ok(Value::Bytes(bytes))
        }
        ColumnType::Time { timezone } => json
            .as_i64()
            .map(|millis| Value::Time(millis, timezone))
            .ok_or_else(|| mismatch(column)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn full_schema() -> Schema {
        Schema::builder()
            .integer("i")
            .long("l")
            .double("d")
            .boolean("b")
            .string("s")
            .bytes("raw")
            .time("ts", Tz::America__New_York)
            .build()
            .unwrap()
    }

    fn full_record() -> Record {
        Record::from(vec![
            Value::Integer(7),
            Value::Long(1_610_668_800_000),
            Value::Double(21.5),
            Value::Boolean(true),
            Value::String("sensor-1".to_string()),
            Value::Bytes(vec![0, 127, 255]),
            Value::Time(1_610_668_800_000, Tz::America__New_York),
        ])
    }

    #[test]
    fn test_all_types_round_trip() {
        let codec = JsonRecordCodec::new(full_schema());
        let record = full_record();
        let bytes = codec.serialize_record(&record).unwrap();
        let restored = codec.deserialize_record(&bytes).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_wire_format_is_a_flat_array() {
        let codec = JsonRecordCodec::new(full_schema());
        let bytes = codec.serialize_record(&full_record()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"[7,1610668800000,21.5,true,"sensor-1",[0,127,255],1610668800000]"#
        );
    }

    #[test]
    fn test_time_zone_is_restored_from_the_column() {
        let codec = JsonRecordCodec::new(
            Schema::builder()
                .time("ts", Tz::America__New_York)
                .build()
                .unwrap(),
        );
        // the record carries UTC; only the instant survives the wire
        let record = Record::from(vec![Value::Time(1_000, Tz::UTC)]);
        let bytes = codec.serialize_record(&record).unwrap();
        let restored = codec.deserialize_record(&bytes).unwrap();
        assert!(matches!(
            restored.values()[0],
            Value::Time(1_000, Tz::America__New_York)
        ));
    }

    #[test]
    fn test_nulls_only_pass_through_nullable_columns() {
        let nullable = JsonRecordCodec::new(
            Schema::new(vec![ColumnDef::nullable("v", ColumnType::Long)]).unwrap(),
        );
        let bytes = nullable
            .serialize_record(&Record::from(vec![Value::Null]))
            .unwrap();
        assert_eq!(bytes, b"[null]");
        assert_eq!(
            nullable.deserialize_record(&bytes).unwrap(),
            Record::from(vec![Value::Null])
        );

        let strict =
            JsonRecordCodec::new(Schema::new(vec![ColumnDef::new("v", ColumnType::Long)]).unwrap());
        assert!(matches!(
            strict.serialize_record(&Record::from(vec![Value::Null])),
            Err(SerializationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            strict.deserialize_record(b"[null]"),
            Err(SerializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_arity_is_checked_both_ways() {
        let codec = JsonRecordCodec::new(Schema::builder().long("a").long("b").build().unwrap());
        assert!(matches!(
            codec.serialize_record(&Record::from(vec![Value::Long(1)])),
            Err(SerializationError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            codec.deserialize_record(b"[1,2,3]"),
            Err(SerializationError::ArityMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_non_finite_doubles_are_rejected() {
        let codec = JsonRecordCodec::new(Schema::builder().double("d").build().unwrap());
        let err = codec
            .serialize_record(&Record::from(vec![Value::Double(f64::NAN)]))
            .unwrap_err();
        assert!(matches!(err, SerializationError::UnsupportedValue { .. }));
    }

    #[test]
    fn test_deserialization_does_not_coerce() {
        let codec = JsonRecordCodec::new(Schema::builder().long("n").build().unwrap());
        // a numeric string is not a number
        assert!(matches!(
            codec.deserialize_record(br#"["42"]"#),
            Err(SerializationError::TypeMismatch { .. })
        ));

        let codec = JsonRecordCodec::new(Schema::builder().integer("n").build().unwrap());
        // out of i32 range
        assert!(matches!(
            codec.deserialize_record(b"[3000000000]"),
            Err(SerializationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_byte_values_out_of_range_are_invalid_data() {
        let codec = JsonRecordCodec::new(Schema::builder().bytes("raw").build().unwrap());
        assert!(matches!(
            codec.deserialize_record(b"[[0,256]]"),
            Err(SerializationError::InvalidData { .. })
        ));
    }

    #[test]
    fn test_value_not_matching_its_column_fails_serialization() {
        let codec = JsonRecordCodec::new(Schema::builder().long("n").build().unwrap());
        let err = codec
            .serialize_record(&Record::from(vec![Value::String("oops".to_string())]))
            .unwrap_err();
        assert_eq!(err.to_string(), "value for column \"n\" is not a valid LONG");
    }

    #[test]
    fn test_malformed_json_surfaces_the_parser_error() {
        let codec = JsonRecordCodec::new(Schema::builder().long("n").build().unwrap());
        assert!(matches!(
            codec.deserialize_record(b"{not json"),
            Err(SerializationError::Json(_))
        ));
    }
}
