// Time windowing: fixed-size, non-overlapping, possibly-empty windows over
// ordered sequences, with timezone and offset aware boundaries

pub mod config;
pub mod engine;

pub use config::{TimeUnit, TimeWindow, TimeWindowBuilder};
pub use engine::BoundTimeWindow;

/// Name of the appended window start column.
pub const WINDOW_START_COLUMN: &str = "window_start_time";

/// Name of the appended window end column.
pub const WINDOW_END_COLUMN: &str = "window_end_time";
