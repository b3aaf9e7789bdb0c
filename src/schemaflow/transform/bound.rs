//! Bound transforms: a transform resolved against a concrete input schema.

use std::fmt;

use crate::schemaflow::error::ShapeError;
use crate::schemaflow::record::{Record, Sequence, Value};
use crate::schemaflow::schema::Schema;

use super::ops::Transform;

/// The record-level plan a transform resolves to at bind time.
#[derive(Debug, Clone)]
pub(super) enum BoundOp {
    AppendConstant { value: Value },
    KeepColumns { indices: Vec<usize> },
    Identity,
}

/// A [`Transform`] bound to an input schema.
///
/// Immutable and `Send + Sync`: one bound transform can be shared freely
/// across partitions or threads. Its output schema was computed at bind time,
/// so every record produced by [`map`](BoundTransform::map) conforms to it by
/// construction.
#[derive(Debug, Clone)]
pub struct BoundTransform {
    transform: Transform,
    input_schema: Schema,
    output_schema: Schema,
    op: BoundOp,
}

impl BoundTransform {
    pub(super) fn new(
        transform: Transform,
        input_schema: Schema,
        output_schema: Schema,
        op: BoundOp,
    ) -> Self {
        BoundTransform {
            transform,
            input_schema,
            output_schema,
            op,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Map one record.
    ///
    /// The record is validated against the input schema first; a record that
    /// does not conform is an upstream contract violation and is reported as
    /// a [`ShapeError`], never coerced.
    pub fn map(&self, record: &Record) -> Result<Record, ShapeError> {
        self.input_schema.validate(record)?;
        let values = record.values();
        let out = match &self.op {
            BoundOp::AppendConstant { value } => {
                let mut mapped = record.clone();
                mapped.push(value.clone());
                mapped
            }
            BoundOp::KeepColumns { indices } => {
                indices.iter().map(|&i| values[i].clone()).collect()
            }
            BoundOp::Identity => record.clone(),
        };
        Ok(out)
    }

    /// Map every record of a sequence, preserving order.
    pub fn map_sequence(&self, sequence: &Sequence) -> Result<Sequence, ShapeError> {
        let mut out = Vec::with_capacity(sequence.len());
        for record in sequence.iter() {
            out.push(self.map(record)?);
        }
        Ok(Sequence::from(out))
    }
}

impl fmt::Display for BoundTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.transform)
    }
}
