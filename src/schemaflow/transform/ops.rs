//! The transform operations and their schema propagation rules.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::bound::{BoundOp, BoundTransform};
use crate::schemaflow::error::BindError;
use crate::schemaflow::record::Value;
use crate::schemaflow::schema::{ColumnDef, ColumnType, Schema};

/// A record transform, declared as data.
///
/// A `Transform` is an unbound configuration: it can be serialized, inspected
/// and chained into a [`TransformPipeline`](super::TransformPipeline) without
/// any schema in sight. Applying it happens in two phases. [`propagate`]
/// computes the output schema for a given input schema, purely and without
/// touching records. [`bind`] additionally resolves column positions and
/// returns an immutable [`BoundTransform`] that maps records.
///
/// The variant set is closed so that schema propagation and serialization can
/// be matched exhaustively.
///
/// [`propagate`]: Transform::propagate
/// [`bind`]: Transform::bind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    /// Append a column holding the same constant value in every record.
    /// The column type is derived from the value.
    AddConstantColumn { name: String, value: Value },
    /// Drop the named columns from the schema and from every record.
    RemoveColumns { columns: Vec<String> },
    /// Rename columns pairwise, `(from, to)`. Schema-only: records pass
    /// through unchanged.
    RenameColumns { renames: Vec<(String, String)> },
}

impl Transform {
    /// Names of the columns this transform creates or renames, for lineage.
    pub fn output_column_names(&self) -> Vec<String> {
        match self {
            Transform::AddConstantColumn { name, .. } => vec![name.clone()],
            Transform::RemoveColumns { .. } => Vec::new(),
            Transform::RenameColumns { renames } => {
                renames.iter().map(|(_, to)| to.clone()).collect()
            }
        }
    }

    /// Compute the output schema for the given input schema.
    ///
    /// Pure and record-free: calling this twice with the same input yields the
    /// same output. Fails fast when a referenced column is missing or the
    /// resulting schema would be invalid.
    pub fn propagate(&self, schema: &Schema) -> Result<Schema, BindError> {
        match self {
            Transform::AddConstantColumn { name, value } => {
                let column_type =
                    ColumnType::for_value(value).ok_or_else(|| BindError::UntypedConstant {
                        column: name.clone(),
                    })?;
                let mut columns = schema.columns().to_vec();
                columns.push(ColumnDef::new(name.clone(), column_type));
                Ok(schema.with_columns(columns)?)
            }
            Transform::RemoveColumns { columns } => {
                for name in columns {
                    if !schema.has_column(name) {
                        return Err(BindError::missing_column(name, "input"));
                    }
                }
                let removed: HashSet<&str> = columns.iter().map(String::as_str).collect();
                let kept = schema
                    .columns()
                    .iter()
                    .filter(|c| !removed.contains(c.name()))
                    .cloned()
                    .collect();
                Ok(schema.with_columns(kept)?)
            }
            Transform::RenameColumns { renames } => {
                let mut mapping: HashMap<&str, &str> = HashMap::new();
                for (from, to) in renames {
                    if !schema.has_column(from) {
                        return Err(BindError::missing_column(from, "input"));
                    }
                    if mapping.insert(from.as_str(), to.as_str()).is_some() {
                        return Err(BindError::DuplicateRename {
                            column: from.clone(),
                        });
                    }
                }
                let columns = schema
                    .columns()
                    .iter()
                    .map(|c| match mapping.get(c.name()) {
                        Some(&new_name) => c.clone().with_name(new_name),
                        None => c.clone(),
                    })
                    .collect();
                Ok(schema.with_columns(columns)?)
            }
        }
    }

    /// Bind this transform against an input schema.
    ///
    /// Validates the same preconditions as [`propagate`](Transform::propagate),
    /// resolves column positions once, and returns an immutable bound stage.
    /// The transform itself is never mutated and can be bound again, against
    /// the same schema or a different one.
    pub fn bind(&self, schema: &Schema) -> Result<BoundTransform, BindError> {
        let output_schema = self.propagate(schema)?;
        let op = match self {
            Transform::AddConstantColumn { value, .. } => BoundOp::AppendConstant {
                value: value.clone(),
            },
            Transform::RemoveColumns { columns } => {
                let indices = schema
                    .columns()
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !columns.iter().any(|name| name == c.name()))
                    .map(|(i, _)| i)
                    .collect();
                BoundOp::KeepColumns { indices }
            }
            Transform::RenameColumns { .. } => BoundOp::Identity,
        };
        Ok(BoundTransform::new(
            self.clone(),
            schema.clone(),
            output_schema,
            op,
        ))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::AddConstantColumn { name, value } => {
                write!(f, "AddConstantColumn(name=\"{}\", value={})", name, value)
            }
            Transform::RemoveColumns { columns } => {
                write!(f, "RemoveColumns(columns={:?})", columns)
            }
            Transform::RenameColumns { renames } => {
                write!(f, "RenameColumns(")?;
                for (i, (from, to)) in renames.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\" -> \"{}\"", from, to)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemaflow::error::SchemaError;
    use crate::schemaflow::record::Record;

    fn base_schema() -> Schema {
        Schema::builder()
            .string("sensor")
            .double("reading")
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_constant_appends_a_typed_column() {
        let transform = Transform::AddConstantColumn {
            name: "site".to_string(),
            value: Value::String("berlin".to_string()),
        };
        let out = transform.propagate(&base_schema()).unwrap();
        assert_eq!(out.column_names(), vec!["sensor", "reading", "site"]);
        assert_eq!(
            out.column_named("site").map(|c| c.column_type()),
            Some(ColumnType::String)
        );
    }

    #[test]
    fn test_add_constant_rejects_null_constants() {
        let transform = Transform::AddConstantColumn {
            name: "site".to_string(),
            value: Value::Null,
        };
        assert!(matches!(
            transform.propagate(&base_schema()),
            Err(BindError::UntypedConstant { .. })
        ));
    }

    #[test]
    fn test_add_constant_rejects_colliding_names() {
        let transform = Transform::AddConstantColumn {
            name: "sensor".to_string(),
            value: Value::Long(1),
        };
        assert!(matches!(
            transform.propagate(&base_schema()),
            Err(BindError::Schema(SchemaError::DuplicateColumn { .. }))
        ));
    }

    #[test]
    fn test_remove_columns_drops_named_columns() {
        let transform = Transform::RemoveColumns {
            columns: vec!["sensor".to_string()],
        };
        let out = transform.propagate(&base_schema()).unwrap();
        assert_eq!(out.column_names(), vec!["reading"]);
    }

    #[test]
    fn test_remove_of_a_missing_column_fails() {
        let transform = Transform::RemoveColumns {
            columns: vec!["nope".to_string()],
        };
        assert!(matches!(
            transform.propagate(&base_schema()),
            Err(BindError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_rename_is_schema_only() {
        let transform = Transform::RenameColumns {
            renames: vec![("reading".to_string(), "temperature".to_string())],
        };
        let out = transform.propagate(&base_schema()).unwrap();
        assert_eq!(out.column_names(), vec!["sensor", "temperature"]);

        let bound = transform.bind(&base_schema()).unwrap();
        let record = Record::from(vec![Value::String("s".to_string()), Value::Double(1.0)]);
        assert_eq!(bound.map(&record).unwrap(), record);
    }

    #[test]
    fn test_rename_collisions_surface_as_schema_errors() {
        let transform = Transform::RenameColumns {
            renames: vec![("reading".to_string(), "sensor".to_string())],
        };
        assert!(matches!(
            transform.propagate(&base_schema()),
            Err(BindError::Schema(SchemaError::DuplicateColumn { .. }))
        ));
    }

    #[test]
    fn test_rename_rejects_duplicate_source_columns() {
        let transform = Transform::RenameColumns {
            renames: vec![
                ("reading".to_string(), "temperature".to_string()),
                ("reading".to_string(), "humidity".to_string()),
            ],
        };
        assert_eq!(
            transform.propagate(&base_schema()).unwrap_err(),
            BindError::DuplicateRename {
                column: "reading".to_string(),
            }
        );
        // bind validates through the same path
        assert!(transform.bind(&base_schema()).is_err());
    }

    #[test]
    fn test_propagation_is_deterministic_for_a_fixed_input() {
        let transform = Transform::AddConstantColumn {
            name: "flag".to_string(),
            value: Value::Boolean(true),
        };
        let schema = base_schema();
        let first = transform.propagate(&schema).unwrap();
        let second = transform.propagate(&schema).unwrap();
        assert_eq!(first, second);
        // the input schema is untouched by propagation
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_transforms_serialize_with_an_op_tag() {
        let transform = Transform::RemoveColumns {
            columns: vec!["a".to_string()],
        };
        let json = serde_json::to_value(&transform).unwrap();
        assert_eq!(json["op"], "remove_columns");
        let back: Transform = serde_json::from_value(json).unwrap();
        assert_eq!(back, transform);
    }

    #[test]
    fn test_lineage_names_the_created_columns() {
        let add = Transform::AddConstantColumn {
            name: "site".to_string(),
            value: Value::Long(1),
        };
        assert_eq!(add.output_column_names(), vec!["site"]);

        let rename = Transform::RenameColumns {
            renames: vec![("a".to_string(), "b".to_string())],
        };
        assert_eq!(rename.output_column_names(), vec!["b"]);
        assert_eq!(
            rename.to_string(),
            "RenameColumns(\"a\" -> \"b\")"
        );
    }
}
