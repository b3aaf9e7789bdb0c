//! Error types for schema construction, binding, execution and joins.
//!
//! Every failure in the engine is expressed as a typed error and propagated to
//! the caller. Nothing is retried, skipped or logged-and-swallowed: a pipeline
//! either produces output that conforms to its statically computed schema, or
//! it fails with one of the errors below.

use thiserror::Error;

use crate::schemaflow::schema::SchemaKind;

/// Schema construction failures.
///
/// Raised when a [`Schema`](crate::Schema) would violate its own invariants,
/// independent of any record data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Column names within one schema must be unique.
    #[error("duplicate column name \"{name}\" in schema")]
    DuplicateColumn { name: String },
}

/// Window configuration failures.
///
/// Raised by [`TimeWindowBuilder::build`](crate::TimeWindowBuilder::build)
/// before any schema is involved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowConfigError {
    #[error("time column is not set")]
    MissingTimeColumn,

    #[error("window size is not set")]
    MissingWindowSize,

    /// The window size, converted to milliseconds, must be at least 1.
    #[error("window size must be positive, computed {millis} ms")]
    NonPositiveWindowSize { millis: i64 },
}

/// Failures binding a transform, window or join configuration to a schema.
///
/// Binding validates a configuration against a concrete input schema and
/// computes the output schema. All of these are raised before any record is
/// processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// The operation requires a different schema kind, e.g. time windowing
    /// over a standard (non-sequence) schema.
    #[error("{operation} requires a {expected} schema, found {actual}")]
    SchemaKindMismatch {
        operation: String,
        expected: SchemaKind,
        actual: SchemaKind,
    },

    /// A referenced column does not exist. `schema` names which schema was
    /// searched ("input", "left" or "right").
    #[error("no column named \"{column}\" in the {schema} schema")]
    MissingColumn { column: String, schema: String },

    /// A referenced column exists but has the wrong type.
    #[error("column \"{column}\" has type {actual}, expected {expected}")]
    ColumnTypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// A constant column value of `Null` carries no type, so no output column
    /// can be derived for it.
    #[error("constant value for column \"{column}\" is null; no column type can be derived")]
    UntypedConstant { column: String },

    /// A rename lists the same source column more than once.
    #[error("column \"{column}\" is renamed more than once")]
    DuplicateRename { column: String },

    /// A join was configured without any key columns.
    #[error("join requires at least one key column")]
    NoJoinKeyColumns,

    /// Join keys must be present in every record, so a key column cannot be
    /// nullable.
    #[error("join key column \"{column}\" is nullable in the {schema} schema")]
    NullableKeyColumn { column: String, schema: String },

    /// The output schema produced by the operation would itself be invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl BindError {
    pub fn missing_column(column: impl Into<String>, schema: impl Into<String>) -> Self {
        BindError::MissingColumn {
            column: column.into(),
            schema: schema.into(),
        }
    }

    pub fn column_type_mismatch(
        column: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        BindError::ColumnTypeMismatch {
            column: column.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Record shape violations detected at execution time.
///
/// A bound stage validates every record against its input schema before
/// mapping it. These errors indicate an upstream contract violation; values
/// are never coerced to fit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    /// The record has a different number of values than the schema has columns.
    #[error("record has {actual} values but the schema defines {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    /// A value's type does not match its column's declared type.
    #[error("value for column \"{column}\" has type {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// A null value appeared in a column not declared nullable.
    #[error("null value in non-nullable column \"{column}\"")]
    NullValue { column: String },

    /// With order validation enabled, a sequence timestamp went backwards.
    #[error(
        "sequence time value {time} at step {position} is earlier than preceding value {previous}"
    )]
    OutOfOrderSequence {
        position: usize,
        time: i64,
        previous: i64,
    },
}

/// Join key cardinality violations.
///
/// Joins require at most one record per key on each side. Finding more is
/// fatal; the engine never silently picks one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JoinError {
    #[error("multiple left-side records share join key \"{key}\"")]
    MultipleLeftValues { key: String },

    #[error("multiple right-side records share join key \"{key}\"")]
    MultipleRightValues { key: String },
}

/// Umbrella error for executor entry points, which can fail at binding,
/// record validation or join stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Join(#[from] JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_messages_name_the_offending_column() {
        let err = BindError::missing_column("user_id", "left");
        assert_eq!(
            err.to_string(),
            "no column named \"user_id\" in the left schema"
        );

        let err = BindError::column_type_mismatch("ts", "TIME", "STRING");
        assert_eq!(
            err.to_string(),
            "column \"ts\" has type STRING, expected TIME"
        );
    }

    #[test]
    fn test_pipeline_error_wraps_sources_transparently() {
        let shape = ShapeError::ArityMismatch {
            expected: 3,
            actual: 2,
        };
        let wrapped = PipelineError::from(shape.clone());
        assert_eq!(wrapped.to_string(), shape.to_string());

        let join = JoinError::MultipleLeftValues {
            key: "k1".to_string(),
        };
        let wrapped = PipelineError::from(join.clone());
        assert_eq!(wrapped.to_string(), join.to_string());
    }

    #[test]
    fn test_schema_error_converts_into_bind_error() {
        let err: BindError = SchemaError::DuplicateColumn {
            name: "twice".to_string(),
        }
        .into();
        assert!(matches!(err, BindError::Schema(_)));
        assert_eq!(err.to_string(), "duplicate column name \"twice\" in schema");
    }
}
