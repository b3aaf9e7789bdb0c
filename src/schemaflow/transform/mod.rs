// Transform framework: serializable configs, static schema propagation,
// two-phase binding into immutable executables

pub mod bound;
pub mod ops;
pub mod pipeline;

pub use bound::BoundTransform;
pub use ops::Transform;
pub use pipeline::{BoundPipeline, TransformPipeline};
