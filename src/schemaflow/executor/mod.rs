//! In-memory reference executor.
//!
//! Runs bound pipelines, windows and joins over in-memory collections. This
//! is the reference implementation of the execution contract: a distributed
//! host applies the same bound stages to its own partitions and is expected
//! to produce identical output. Every entry point fails on the first error;
//! nothing is retried or skipped.

use std::collections::BTreeMap;

use crate::schemaflow::error::PipelineError;
use crate::schemaflow::join::{join_key_group, Join, JoinSide, JoinValue, JoinedValue};
use crate::schemaflow::record::{Record, Sequence};
use crate::schemaflow::transform::BoundPipeline;
use crate::schemaflow::window::BoundTimeWindow;

/// Executes bound stages over in-memory data.
pub struct LocalExecutor;

impl LocalExecutor {
    /// Map every record through a bound pipeline, preserving input order.
    pub fn execute(
        pipeline: &BoundPipeline,
        records: &[Record],
    ) -> Result<Vec<Record>, PipelineError> {
        log::debug!(
            "Executing {} pipeline stages over {} records",
            pipeline.len(),
            records.len()
        );
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(pipeline.map(record)?);
        }
        Ok(out)
    }

    /// Map every sequence through a bound pipeline, record for record.
    pub fn execute_sequences(
        pipeline: &BoundPipeline,
        sequences: &[Sequence],
    ) -> Result<Vec<Sequence>, PipelineError> {
        log::debug!(
            "Executing {} pipeline stages over {} sequences",
            pipeline.len(),
            sequences.len()
        );
        let mut out = Vec::with_capacity(sequences.len());
        for sequence in sequences {
            out.push(pipeline.map_sequence(sequence)?);
        }
        Ok(out)
    }

    /// Window every sequence independently. Each input sequence yields its
    /// own vector of windows; sequences are never merged.
    pub fn execute_windows(
        window: &BoundTimeWindow,
        sequences: &[Sequence],
    ) -> Result<Vec<Vec<Sequence>>, PipelineError> {
        log::debug!(
            "Windowing {} sequences into {} ms windows",
            sequences.len(),
            window.window_size_ms()
        );
        let mut out = Vec::with_capacity(sequences.len());
        for sequence in sequences {
            out.push(window.apply_to_sequence(sequence)?);
        }
        Ok(out)
    }

    /// Join two keyed record collections.
    ///
    /// Both sides are grouped by their rendered key values, each group is
    /// merged with [`Join::join_records`] under the one-record-per-side rule
    /// and the merged values are filtered by the join type. Groups are
    /// processed in key order, so output is deterministic regardless of
    /// input order.
    pub fn execute_join(
        join: &Join,
        left: Vec<Record>,
        right: Vec<Record>,
    ) -> Result<Vec<JoinedValue>, PipelineError> {
        log::debug!(
            "Joining {} left and {} right records ({})",
            left.len(),
            right.len(),
            join.join_type()
        );
        let mut groups: BTreeMap<String, Vec<JoinValue>> = BTreeMap::new();
        for record in left {
            let key = join.key_for(&record, JoinSide::Left)?;
            groups.entry(key).or_default().push(JoinValue::left(record));
        }
        for record in right {
            let key = join.key_for(&record, JoinSide::Right)?;
            groups
                .entry(key)
                .or_default()
                .push(JoinValue::right(record));
        }
        log::debug!("Grouped into {} join keys", groups.len());

        let mut out = Vec::new();
        for (key, group) in &groups {
            let joined = join_key_group(key, group, |l, r| join.join_records(l, r))?;
            if join
                .join_type()
                .retains(joined.left_present(), joined.right_present())
            {
                out.push(joined);
            }
        }
        Ok(out)
    }
}
