//! # schemaflow
//!
//! A schema-typed transformation engine for tabular and sequential (time series)
//! records. Pipelines declare a [`Schema`] describing column names and types, then
//! compose transforms whose output schemas are computed statically, before any
//! record is processed. On top of that sit a timezone- and offset-aware time
//! windowing engine for ordered sequences, and a join engine with strict
//! duplicate-key detection.
//!
//! ## Features
//!
//! - **Static Schema Propagation**: every stage's output schema is known up front
//! - **Two-Phase Transforms**: serializable configs bind against a schema into
//!   immutable, shareable executables
//! - **Time Windowing**: fixed-size, possibly-empty windows over ordered
//!   sequences, with DST-aware timezone handling and window offsets
//! - **Keyed Joins**: inner/outer joins over keyed record streams, failing fast
//!   on duplicate keys
//! - **JSON Everywhere**: pipeline definitions and records round-trip through
//!   JSON via `serde`
//!
//! ## Quick Start
//!
//! ```rust
//! use schemaflow::{Record, Schema, Transform, TransformPipeline, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Schema::builder()
//!         .string("sensor")
//!         .double("reading")
//!         .build()?;
//!
//!     let pipeline = TransformPipeline::new(schema)
//!         .add(Transform::AddConstantColumn {
//!             name: "site".to_string(),
//!             value: Value::String("berlin".to_string()),
//!         })
//!         .add(Transform::RenameColumns {
//!             renames: vec![("reading".to_string(), "temperature_c".to_string())],
//!         });
//!
//!     // The full schema chain is available before any record is seen
//!     let output_schema = pipeline.output_schema()?;
//!     assert_eq!(
//!         output_schema.column_names(),
//!         vec!["sensor", "temperature_c", "site"]
//!     );
//!
//!     let bound = pipeline.bind()?;
//!     let record = Record::from(vec![
//!         Value::String("s-1".to_string()),
//!         Value::Double(21.5),
//!     ]);
//!     let out = bound.map(&record)?;
//!     assert_eq!(out.len(), 3);
//!     Ok(())
//! }
//! ```

pub mod schemaflow;

// Re-export the main API at the crate root
pub use schemaflow::error::{
    BindError, JoinError, PipelineError, SchemaError, ShapeError, WindowConfigError,
};
pub use schemaflow::executor::LocalExecutor;
pub use schemaflow::join::{Join, JoinSide, JoinType, JoinValue, JoinedValue};
pub use schemaflow::record::{Record, Sequence, Value};
pub use schemaflow::schema::{ColumnDef, ColumnType, Schema, SchemaBuilder, SchemaKind};
pub use schemaflow::serialization::{JsonRecordCodec, RecordCodec, SerializationError};
pub use schemaflow::transform::{BoundPipeline, BoundTransform, Transform, TransformPipeline};
pub use schemaflow::window::{
    BoundTimeWindow, TimeUnit, TimeWindow, TimeWindowBuilder, WINDOW_END_COLUMN,
    WINDOW_START_COLUMN,
};
