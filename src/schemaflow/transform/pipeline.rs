//! Multi-stage transform pipelines with statically chained schemas.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schemaflow::error::{BindError, ShapeError};
use crate::schemaflow::record::{Record, Sequence};
use crate::schemaflow::schema::Schema;

use super::bound::BoundTransform;
use super::ops::Transform;

/// An ordered chain of transforms over a declared initial schema.
///
/// The pipeline is plain data: it serializes to JSON and back, and the entire
/// schema chain is computable through [`output_schema`] before any record is
/// processed. Execution goes through [`bind`], which validates every stage
/// against its input schema in order and fails fast on the first mismatch.
///
/// [`output_schema`]: TransformPipeline::output_schema
/// [`bind`]: TransformPipeline::bind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformPipeline {
    initial_schema: Schema,
    steps: Vec<Transform>,
}

impl TransformPipeline {
    pub fn new(initial_schema: Schema) -> Self {
        TransformPipeline {
            initial_schema,
            steps: Vec::new(),
        }
    }

    /// Append a stage.
    pub fn add(mut self, transform: Transform) -> Self {
        self.steps.push(transform);
        self
    }

    pub fn initial_schema(&self) -> &Schema {
        &self.initial_schema
    }

    pub fn steps(&self) -> &[Transform] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The schema records will have after the final stage, computed by folding
    /// [`Transform::propagate`] over every step.
    pub fn output_schema(&self) -> Result<Schema, BindError> {
        let mut schema = self.initial_schema.clone();
        for step in &self.steps {
            schema = step.propagate(&schema)?;
        }
        Ok(schema)
    }

    /// Every intermediate schema: the initial schema first, then one entry per
    /// stage, the final output schema last.
    pub fn schemas(&self) -> Result<Vec<Schema>, BindError> {
        let mut out = Vec::with_capacity(self.steps.len() + 1);
        let mut schema = self.initial_schema.clone();
        out.push(schema.clone());
        for step in &self.steps {
            schema = step.propagate(&schema)?;
            out.push(schema.clone());
        }
        Ok(out)
    }

    /// Bind every stage in order. Any stage failure aborts the whole bind.
    pub fn bind(&self) -> Result<BoundPipeline, BindError> {
        let mut schema = self.initial_schema.clone();
        let mut stages = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let bound = step.bind(&schema)?;
            schema = bound.output_schema().clone();
            stages.push(bound);
        }
        Ok(BoundPipeline {
            initial_schema: self.initial_schema.clone(),
            output_schema: schema,
            stages,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for TransformPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransformPipeline[")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", step)?;
        }
        write!(f, "]")
    }
}

/// A fully bound pipeline: every stage resolved, every schema precomputed.
///
/// Immutable and `Send + Sync`, shareable across partitions.
#[derive(Debug, Clone)]
pub struct BoundPipeline {
    initial_schema: Schema,
    output_schema: Schema,
    stages: Vec<BoundTransform>,
}

impl BoundPipeline {
    pub fn initial_schema(&self) -> &Schema {
        &self.initial_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn stages(&self) -> &[BoundTransform] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Per-stage schema lineage: initial schema first, final output last.
    pub fn schemas(&self) -> Vec<&Schema> {
        let mut out = Vec::with_capacity(self.stages.len() + 1);
        out.push(&self.initial_schema);
        for stage in &self.stages {
            out.push(stage.output_schema());
        }
        out
    }

    /// Run one record through every stage.
    pub fn map(&self, record: &Record) -> Result<Record, ShapeError> {
        if self.stages.is_empty() {
            self.initial_schema.validate(record)?;
            return Ok(record.clone());
        }
        let mut current = self.stages[0].map(record)?;
        for stage in &self.stages[1..] {
            current = stage.map(&current)?;
        }
        Ok(current)
    }

    /// Run one sequence through every stage.
    pub fn map_sequence(&self, sequence: &Sequence) -> Result<Sequence, ShapeError> {
        if self.stages.is_empty() {
            self.initial_schema.validate_sequence(sequence)?;
            return Ok(sequence.clone());
        }
        let mut current = self.stages[0].map_sequence(sequence)?;
        for stage in &self.stages[1..] {
            current = stage.map_sequence(&current)?;
        }
        Ok(current)
    }
}
