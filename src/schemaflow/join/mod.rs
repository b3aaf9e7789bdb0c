// Joining two keyed record streams
//
// A `Join` validates the two input schemas up front and derives the merged
// output schema; `join_key_group` merges one key's worth of grouped values
// with strict duplicate detection. The executor wires the two together.

pub mod config;
pub mod execute;

pub use config::{Join, JoinType};
pub use execute::{join_key_group, JoinSide, JoinValue, JoinedValue};
