//! Join configuration: join type, key columns and the joined output schema.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schemaflow::error::{BindError, ShapeError};
use crate::schemaflow::record::{Record, Value};
use crate::schemaflow::schema::{Schema, SchemaKind};

use super::execute::JoinSide;

/// Separator between key column renderings in a composite grouping key.
const KEY_SEPARATOR: char = '\u{1f}';

/// Escape prefix for separators occurring inside a rendered key value.
const KEY_ESCAPE: char = '\\';

/// Which rows a join keeps when one side has no record for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    /// Keep keys present on both sides only.
    Inner,
    /// Keep every left record, padding absent right sides.
    LeftOuter,
    /// Keep every right record, padding absent left sides.
    RightOuter,
    /// Keep every key seen on either side.
    FullOuter,
}

impl JoinType {
    /// Whether a joined value with the given side presence survives this
    /// join type's filtering.
    pub fn retains(&self, left_present: bool, right_present: bool) -> bool {
        match (left_present, right_present) {
            (true, true) => true,
            (true, false) => matches!(self, JoinType::LeftOuter | JoinType::FullOuter),
            (false, true) => matches!(self, JoinType::RightOuter | JoinType::FullOuter),
            (false, false) => false,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinType::Inner => "inner",
            JoinType::LeftOuter => "left_outer",
            JoinType::RightOuter => "right_outer",
            JoinType::FullOuter => "full_outer",
        };
        write!(f, "{}", name)
    }
}

/// A validated join of two keyed record streams.
///
/// Both sides must be standard (non-sequence) schemas sharing the key columns
/// by name and type; key columns must be non-nullable on both sides. The
/// output schema is all left columns followed by the right side's non-key
/// columns; columns a join type may leave absent are marked nullable. Like
/// every configuration in this crate, a `Join` is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawJoin")]
pub struct Join {
    join_type: JoinType,
    key_columns: Vec<String>,
    left_schema: Schema,
    right_schema: Schema,
    #[serde(skip_serializing)]
    left_key_indices: Vec<usize>,
    #[serde(skip_serializing)]
    right_key_indices: Vec<usize>,
    #[serde(skip_serializing)]
    output_schema: Schema,
}

/// Wire shape of a join, revalidated on deserialization.
#[derive(Deserialize)]
struct RawJoin {
    join_type: JoinType,
    key_columns: Vec<String>,
    left_schema: Schema,
    right_schema: Schema,
}

impl TryFrom<RawJoin> for Join {
    type Error = BindError;

    fn try_from(raw: RawJoin) -> Result<Self, Self::Error> {
        Join::new(
            raw.join_type,
            raw.key_columns,
            raw.left_schema,
            raw.right_schema,
        )
    }
}

impl Join {
    /// Validate and construct a join over the two schemas.
    ///
    /// Fails when no key columns are given, a side is a sequence schema, a
    /// key column is missing on either side, nullable, or typed differently
    /// between the sides, or a non-key column name collides across sides.
    pub fn new(
        join_type: JoinType,
        key_columns: Vec<String>,
        left_schema: Schema,
        right_schema: Schema,
    ) -> Result<Self, BindError> {
        if key_columns.is_empty() {
            return Err(BindError::NoJoinKeyColumns);
        }
        for (label, schema) in [("left", &left_schema), ("right", &right_schema)] {
            if schema.is_sequence() {
                return Err(BindError::SchemaKindMismatch {
                    operation: format!("the {} side of a join", label),
                    expected: SchemaKind::Standard,
                    actual: schema.kind(),
                });
            }
        }

        let mut left_key_indices = Vec::with_capacity(key_columns.len());
        let mut right_key_indices = Vec::with_capacity(key_columns.len());
        for key in &key_columns {
            let left_index = left_schema
                .column_index(key)
                .ok_or_else(|| BindError::missing_column(key, "left"))?;
            let right_index = right_schema
                .column_index(key)
                .ok_or_else(|| BindError::missing_column(key, "right"))?;
            let left_type = left_schema.columns()[left_index].column_type();
            let right_type = right_schema.columns()[right_index].column_type();
            if left_type != right_type {
                return Err(BindError::column_type_mismatch(
                    key,
                    left_type.type_name(),
                    right_type.type_name(),
                ));
            }
            for (label, schema, index) in [
                ("left", &left_schema, left_index),
                ("right", &right_schema, right_index),
            ] {
                if schema.columns()[index].is_nullable() {
                    return Err(BindError::NullableKeyColumn {
                        column: key.clone(),
                        schema: label.to_string(),
                    });
                }
            }
            left_key_indices.push(left_index);
            right_key_indices.push(right_index);
        }

        let output_schema = Self::build_output_schema(
            join_type,
            &key_columns,
            &left_schema,
            &right_schema,
            &right_key_indices,
        )?;

        Ok(Join {
            join_type,
            key_columns,
            left_schema,
            right_schema,
            left_key_indices,
            right_key_indices,
            output_schema,
        })
    }

    fn build_output_schema(
        join_type: JoinType,
        key_columns: &[String],
        left_schema: &Schema,
        right_schema: &Schema,
        right_key_indices: &[usize],
    ) -> Result<Schema, BindError> {
        let keeps_unmatched_left = join_type.retains(true, false);
        let keeps_unmatched_right = join_type.retains(false, true);

        let mut columns = Vec::with_capacity(left_schema.len() + right_schema.len());
        for column in left_schema.columns() {
            let is_key = key_columns.iter().any(|k| k == column.name());
            // key values come from whichever side is present, so keys stay
            // non-nullable even in outer joins
            let nullable = column.is_nullable() || (keeps_unmatched_right && !is_key);
            columns.push(column.clone().with_nullable(nullable));
        }
        for (index, column) in right_schema.columns().iter().enumerate() {
            if right_key_indices.contains(&index) {
                continue;
            }
            let nullable = column.is_nullable() || keeps_unmatched_left;
            columns.push(column.clone().with_nullable(nullable));
        }
        Ok(Schema::new(columns)?)
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn left_schema(&self) -> &Schema {
        &self.left_schema
    }

    pub fn right_schema(&self) -> &Schema {
        &self.right_schema
    }

    /// The schema of merged records: all left columns, then the right side's
    /// non-key columns.
    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Render a record's key column values into a stable grouping key.
    ///
    /// The record is validated against its side's schema first. Key values
    /// render through [`Value::to_key_string`] and join with a unit
    /// separator; separators and escape characters inside a rendered value
    /// are escaped, so conforming records group together exactly when their
    /// key values are equal.
    pub fn key_for(&self, record: &Record, side: JoinSide) -> Result<String, ShapeError> {
        let (schema, indices) = match side {
            JoinSide::Left => (&self.left_schema, &self.left_key_indices),
            JoinSide::Right => (&self.right_schema, &self.right_key_indices),
        };
        schema.validate(record)?;
        let mut key = String::new();
        for (position, &index) in indices.iter().enumerate() {
            if position > 0 {
                key.push(KEY_SEPARATOR);
            }
            for ch in record.values()[index].to_key_string().chars() {
                if ch == KEY_SEPARATOR || ch == KEY_ESCAPE {
                    key.push(KEY_ESCAPE);
                }
                key.push(ch);
            }
        }
        Ok(key)
    }

    /// The default merge: copy the present sides through, pad the absent one
    /// with nulls. Key values come from whichever side is present, so a
    /// right-only record still fills the key positions of the left portion.
    pub fn join_records(&self, left: Option<&Record>, right: Option<&Record>) -> Record {
        let mut values = Vec::with_capacity(self.output_schema.len());
        match (left, right) {
            (Some(l), _) => values.extend(l.values().iter().cloned()),
            (None, Some(r)) => {
                for index in 0..self.left_schema.len() {
                    match self.left_key_indices.iter().position(|&k| k == index) {
                        Some(key_position) => values.push(
                            r.get(self.right_key_indices[key_position])
                                .cloned()
                                .unwrap_or(Value::Null),
                        ),
                        None => values.push(Value::Null),
                    }
                }
            }
            (None, None) => {
                values.extend(std::iter::repeat(Value::Null).take(self.left_schema.len()))
            }
        }
        match right {
            Some(r) => {
                for (index, value) in r.values().iter().enumerate() {
                    if !self.right_key_indices.contains(&index) {
                        values.push(value.clone());
                    }
                }
            }
            None => {
                let non_key = self.right_schema.len() - self.right_key_indices.len();
                values.extend(std::iter::repeat(Value::Null).take(non_key));
            }
        }
        Record::from(values)
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Join(type={}, keys={:?}, output={} columns)",
            self.join_type,
            self.key_columns,
            self.output_schema.len()
        )
    }
}
