//! Per-key join execution with strict cardinality checking.

use std::fmt;

use crate::schemaflow::error::JoinError;
use crate::schemaflow::record::Record;

/// Which side of a join a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Left,
    Right,
}

impl JoinSide {
    pub fn opposite(&self) -> JoinSide {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }
}

impl fmt::Display for JoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinSide::Left => write!(f, "left"),
            JoinSide::Right => write!(f, "right"),
        }
    }
}

/// A record tagged with the join side it came from, as produced by keying
/// both input streams and grouping them by key.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinValue {
    side: JoinSide,
    record: Record,
}

impl JoinValue {
    pub fn new(side: JoinSide, record: Record) -> Self {
        JoinValue { side, record }
    }

    pub fn left(record: Record) -> Self {
        Self::new(JoinSide::Left, record)
    }

    pub fn right(record: Record) -> Self {
        Self::new(JoinSide::Right, record)
    }

    pub fn side(&self) -> JoinSide {
        self.side
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

/// The merge result for one key, with flags recording which sides were
/// present. Downstream filtering by join type uses the flags; the merged
/// record is produced by the caller-supplied merge function.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedValue {
    left_present: bool,
    right_present: bool,
    record: Record,
}

impl JoinedValue {
    pub fn new(left_present: bool, right_present: bool, record: Record) -> Self {
        JoinedValue {
            left_present,
            right_present,
            record,
        }
    }

    pub fn left_present(&self) -> bool {
        self.left_present
    }

    pub fn right_present(&self) -> bool {
        self.right_present
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

/// Join the records grouped under one key.
///
/// Each side may contribute at most one record per key. Finding a second
/// left-tagged or right-tagged record is fatal; the engine never silently
/// picks one. The merge function receives whichever side is present (`None`
/// for an absent side) and owns the merge policy; this function owns
/// uniqueness and presence only.
pub fn join_key_group<F>(
    key: &str,
    group: &[JoinValue],
    merge: F,
) -> Result<JoinedValue, JoinError>
where
    F: FnOnce(Option<&Record>, Option<&Record>) -> Record,
{
    let mut left: Option<&Record> = None;
    let mut right: Option<&Record> = None;
    for value in group {
        match value.side() {
            JoinSide::Left => {
                if left.is_some() {
                    return Err(JoinError::MultipleLeftValues {
                        key: key.to_string(),
                    });
                }
                left = Some(value.record());
            }
            JoinSide::Right => {
                if right.is_some() {
                    return Err(JoinError::MultipleRightValues {
                        key: key.to_string(),
                    });
                }
                right = Some(value.record());
            }
        }
    }
    let record = merge(left, right);
    Ok(JoinedValue::new(left.is_some(), right.is_some(), record))
}
