// Schema-typed transformation engine
// Declared schemas, statically propagated transforms, time windowing and keyed joins

pub mod error;
pub mod executor;
pub mod join;
pub mod record;
pub mod schema;
pub mod serialization;
pub mod transform;
pub mod window;

// Re-export main API
pub use error::{BindError, JoinError, PipelineError, SchemaError, ShapeError, WindowConfigError};
pub use executor::LocalExecutor;
pub use join::{Join, JoinSide, JoinType, JoinValue, JoinedValue};
pub use record::{Record, Sequence, Value};
pub use schema::{ColumnDef, ColumnType, Schema, SchemaBuilder, SchemaKind};
pub use serialization::{JsonRecordCodec, RecordCodec, SerializationError};
pub use transform::{BoundPipeline, BoundTransform, Transform, TransformPipeline};
pub use window::{BoundTimeWindow, TimeUnit, TimeWindow, TimeWindowBuilder};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "schema_propagation", // static output schemas for every pipeline stage
    "two_phase_binding",  // serializable configs bound into immutable executables
    "time_windowing",     // fixed-size windows with timezone and offset handling
    "keyed_joins",        // inner/outer joins with duplicate-key detection
    "json_pipelines",     // pipeline definitions round-trip through JSON
    "json_codec",         // schema-driven positional record wire format
];
