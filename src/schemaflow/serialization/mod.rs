//! Pluggable record serialization.
//!
//! A [`RecordCodec`] turns records into bytes and back, driven by a schema so
//! the wire format can stay positional and compact. The crate ships a JSON
//! codec; other formats implement the same trait.
//!
//! # Quick Start
//!
//! ```rust
//! use schemaflow::{JsonRecordCodec, Record, RecordCodec, Schema, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::builder().string("name").long("age").build()?;
//! let codec = JsonRecordCodec::new(schema);
//!
//! let record = Record::from(vec![
//!     Value::String("Alice".to_string()),
//!     Value::Long(30),
//! ]);
//! let bytes = codec.serialize_record(&record)?;
//! assert_eq!(bytes, br#"["Alice",30]"#);
//!
//! let restored = codec.deserialize_record(&bytes)?;
//! assert_eq!(restored, record);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

use crate::schemaflow::record::Record;

mod json_codec;

pub use json_codec::JsonRecordCodec;

/// Core trait for record serialization formats.
pub trait RecordCodec: Send + Sync {
    /// Serialize a complete record.
    fn serialize_record(&self, record: &Record) -> Result<Vec<u8>, SerializationError>;

    /// Deserialize a complete record.
    fn deserialize_record(&self, bytes: &[u8]) -> Result<Record, SerializationError>;

    /// Get the format identifier.
    fn format_name(&self) -> &'static str;
}

/// Serialization error types.
///
/// Local to this module: codecs sit at the edge of the engine and their
/// failures never feed back into binding or execution.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// A value conforms to its column but cannot be represented on the wire.
    #[error("value in column \"{column}\" cannot be serialized: {message}")]
    UnsupportedValue { column: String, message: String },

    /// The payload parsed, but its contents are not what the format produces.
    #[error("invalid wire data: {message}")]
    InvalidData { message: String },

    /// A record holds the wrong number of values for the codec's schema.
    #[error("record has {actual} values but the schema defines {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    /// A value does not fit the column at its position.
    #[error("value for column \"{column}\" is not a valid {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },

    /// Malformed JSON payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SerializationError {
    pub fn unsupported_value(column: impl Into<String>, message: impl Into<String>) -> Self {
        SerializationError::UnsupportedValue {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        SerializationError::InvalidData {
            message: message.into(),
        }
    }

    pub fn type_mismatch(column: impl Into<String>, expected: &'static str) -> Self {
        SerializationError::TypeMismatch {
            column: column.into(),
            expected,
        }
    }
}
