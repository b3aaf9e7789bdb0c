//! Column metadata: declared types and per-column definitions.

use std::fmt;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::schemaflow::record::Value;

/// The declared type of a schema column.
///
/// `Time` columns carry the timezone their instants belong to; the zone is
/// used when windowing and when rendering values, never for comparing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Long,
    Double,
    Boolean,
    String,
    Bytes,
    Time { timezone: Tz },
}

impl ColumnType {
    /// Check whether a value conforms to this column type.
    ///
    /// `Null` never matches a type directly; nullability is a property of the
    /// column, checked by [`Schema::validate`](crate::Schema::validate). Time
    /// values match a `Time` column regardless of the zone they carry, since
    /// the instant is what is typed.
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ColumnType::Integer, Value::Integer(_))
                | (ColumnType::Long, Value::Long(_))
                | (ColumnType::Double, Value::Double(_))
                | (ColumnType::Boolean, Value::Boolean(_))
                | (ColumnType::String, Value::String(_))
                | (ColumnType::Bytes, Value::Bytes(_))
                | (ColumnType::Time { .. }, Value::Time(_, _))
        )
    }

    /// Derive the column type a constant value would occupy.
    ///
    /// Returns `None` for `Null`, which carries no type of its own.
    pub fn for_value(value: &Value) -> Option<ColumnType> {
        match value {
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Long(_) => Some(ColumnType::Long),
            Value::Double(_) => Some(ColumnType::Double),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::String(_) => Some(ColumnType::String),
            Value::Bytes(_) => Some(ColumnType::Bytes),
            Value::Time(_, timezone) => Some(ColumnType::Time {
                timezone: *timezone,
            }),
            Value::Null => None,
        }
    }

    /// Get the type name for error messages and debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Long => "LONG",
            ColumnType::Double => "DOUBLE",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::String => "STRING",
            ColumnType::Bytes => "BYTES",
            ColumnType::Time { .. } => "TIME",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Time { timezone } => write!(f, "TIME[{}]", timezone.name()),
            other => write!(f, "{}", other.type_name()),
        }
    }
}

/// A single column definition: name, type and nullability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    name: String,
    #[serde(flatten)]
    column_type: ColumnType,
    #[serde(default)]
    nullable: bool,
}

impl ColumnDef {
    /// A non-nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            column_type,
            nullable: false,
        }
    }

    /// A nullable column.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnDef {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.column_type)?;
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}
