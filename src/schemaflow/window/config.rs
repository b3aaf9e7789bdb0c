//! Time window configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schemaflow::error::{BindError, WindowConfigError};
use crate::schemaflow::schema::{ColumnDef, ColumnType, Schema, SchemaKind};

use super::engine::BoundTimeWindow;
use super::{WINDOW_END_COLUMN, WINDOW_START_COLUMN};

/// Units a window size or offset can be declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Convert an amount of this unit to milliseconds, saturating on overflow.
    pub fn as_millis(&self, amount: i64) -> i64 {
        match self {
            TimeUnit::Milliseconds => amount,
            TimeUnit::Seconds => amount.saturating_mul(1_000),
            TimeUnit::Minutes => amount.saturating_mul(60_000),
            TimeUnit::Hours => amount.saturating_mul(3_600_000),
            TimeUnit::Days => amount.saturating_mul(86_400_000),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        };
        write!(f, "{}", name)
    }
}

/// A validated, unbound time window configuration.
///
/// Windows are non-overlapping and fixed-size. Each record of a sequence is
/// assigned to the window its time column value falls into; window boundaries
/// respect the time column's timezone (so e.g. daily windows align with local
/// midnight, DST included) and can be shifted by a configurable offset.
///
/// Construction goes through [`TimeWindow::builder`], which rejects invalid
/// configurations before any schema is involved. Binding against a sequence
/// schema yields a [`BoundTimeWindow`] that partitions sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    time_column: String,
    window_size: i64,
    window_size_unit: TimeUnit,
    offset_amount: i64,
    offset_unit: Option<TimeUnit>,
    add_window_start_column: bool,
    add_window_end_column: bool,
    exclude_empty_windows: bool,
    validate_order: bool,
    #[serde(skip_serializing)]
    window_size_ms: i64,
    #[serde(skip_serializing)]
    offset_ms: i64,
}

/// Wire shape of a window configuration, revalidated on deserialization.
#[derive(Deserialize)]
struct RawTimeWindow {
    time_column: String,
    window_size: i64,
    window_size_unit: TimeUnit,
    #[serde(default)]
    offset_amount: i64,
    #[serde(default)]
    offset_unit: Option<TimeUnit>,
    #[serde(default)]
    add_window_start_column: bool,
    #[serde(default)]
    add_window_end_column: bool,
    #[serde(default)]
    exclude_empty_windows: bool,
    #[serde(default)]
    validate_order: bool,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = WindowConfigError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        let mut builder = TimeWindow::builder()
            .time_column(raw.time_column)
            .window_size(raw.window_size, raw.window_size_unit)
            .add_window_start_column(raw.add_window_start_column)
            .add_window_end_column(raw.add_window_end_column)
            .exclude_empty_windows(raw.exclude_empty_windows)
            .validate_order(raw.validate_order);
        if let Some(unit) = raw.offset_unit {
            builder = builder.offset(raw.offset_amount, unit);
        }
        builder.build()
    }
}

impl TimeWindow {
    pub fn builder() -> TimeWindowBuilder {
        TimeWindowBuilder::default()
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    /// The window size in milliseconds. Always positive.
    pub fn window_size_ms(&self) -> i64 {
        self.window_size_ms
    }

    /// The configured window offset in milliseconds, zero when unset.
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    pub fn add_window_start_column(&self) -> bool {
        self.add_window_start_column
    }

    pub fn add_window_end_column(&self) -> bool {
        self.add_window_end_column
    }

    pub fn exclude_empty_windows(&self) -> bool {
        self.exclude_empty_windows
    }

    pub fn validate_order(&self) -> bool {
        self.validate_order
    }

    fn check_schema(&self, schema: &Schema) -> Result<(usize, chrono_tz::Tz), BindError> {
        if !schema.is_sequence() {
            return Err(BindError::SchemaKindMismatch {
                operation: "time windowing".to_string(),
                expected: SchemaKind::Sequence,
                actual: schema.kind(),
            });
        }
        let index = schema
            .column_index(&self.time_column)
            .ok_or_else(|| BindError::missing_column(&self.time_column, "input"))?;
        match schema.columns()[index].column_type() {
            ColumnType::Time { timezone } => Ok((index, timezone)),
            other => Err(BindError::column_type_mismatch(
                &self.time_column,
                "TIME",
                other.type_name(),
            )),
        }
    }

    /// Compute the output schema for the given input schema.
    ///
    /// When start/end columns are requested they are appended in that order as
    /// `Time` columns carrying the bound time column's timezone; otherwise the
    /// input schema passes through unchanged. Enforces the same preconditions
    /// as [`bind`](TimeWindow::bind).
    pub fn propagate(&self, schema: &Schema) -> Result<Schema, BindError> {
        let (_, timezone) = self.check_schema(schema)?;
        if !self.add_window_start_column && !self.add_window_end_column {
            return Ok(schema.clone());
        }
        let mut columns = schema.columns().to_vec();
        if self.add_window_start_column {
            columns.push(ColumnDef::new(
                WINDOW_START_COLUMN,
                ColumnType::Time { timezone },
            ));
        }
        if self.add_window_end_column {
            columns.push(ColumnDef::new(
                WINDOW_END_COLUMN,
                ColumnType::Time { timezone },
            ));
        }
        Ok(schema.with_columns(columns)?)
    }

    /// Bind this configuration against a sequence schema.
    ///
    /// The schema must be a sequence schema whose time column exists and is
    /// `Time`-typed. The column's timezone is captured here, once; the bound
    /// window is immutable afterwards.
    pub fn bind(&self, schema: &Schema) -> Result<BoundTimeWindow, BindError> {
        let (time_index, timezone) = self.check_schema(schema)?;
        let output_schema = self.propagate(schema)?;
        Ok(BoundTimeWindow::new(
            self.clone(),
            schema.clone(),
            output_schema,
            time_index,
            timezone,
        ))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimeWindow(column=\"{}\", size={} {}",
            self.time_column, self.window_size, self.window_size_unit
        )?;
        if let (true, Some(unit)) = (self.offset_amount != 0, self.offset_unit) {
            write!(f, ", offset={} {}", self.offset_amount, unit)?;
        }
        if self.add_window_start_column {
            write!(f, ", addWindowStartColumn")?;
        }
        if self.add_window_end_column {
            write!(f, ", addWindowEndColumn")?;
        }
        if self.exclude_empty_windows {
            write!(f, ", excludeEmptyWindows")?;
        }
        write!(f, ")")
    }
}

/// Builder for [`TimeWindow`]. Time column and window size are required;
/// everything else defaults to off.
#[derive(Debug, Default, Clone)]
pub struct TimeWindowBuilder {
    time_column: Option<String>,
    window_size: Option<(i64, TimeUnit)>,
    offset: Option<(i64, TimeUnit)>,
    add_window_start_column: bool,
    add_window_end_column: bool,
    exclude_empty_windows: bool,
    validate_order: bool,
}

impl TimeWindowBuilder {
    /// Name of the column that provides each record's time. Must be a `Time`
    /// column in the bound schema.
    pub fn time_column(mut self, name: impl Into<String>) -> Self {
        self.time_column = Some(name.into());
        self
    }

    pub fn window_size(mut self, amount: i64, unit: TimeUnit) -> Self {
        self.window_size = Some((amount, unit));
        self
    }

    /// Shift window boundaries forward or back, e.g. to window 10:15 to 11:15
    /// instead of 10:00 to 11:00. The amount may be negative.
    pub fn offset(mut self, amount: i64, unit: TimeUnit) -> Self {
        self.offset = Some((amount, unit));
        self
    }

    /// Append a `Time` column holding each record's window start.
    pub fn add_window_start_column(mut self, add: bool) -> Self {
        self.add_window_start_column = add;
        self
    }

    /// Append a `Time` column holding each record's (exclusive) window end.
    pub fn add_window_end_column(mut self, add: bool) -> Self {
        self.add_window_end_column = add;
        self
    }

    /// Drop windows that contain no records instead of emitting them empty.
    pub fn exclude_empty_windows(mut self, exclude: bool) -> Self {
        self.exclude_empty_windows = exclude;
        self
    }

    /// Fail on sequences whose time values go backwards. Off by default:
    /// callers normally guarantee sequence order.
    pub fn validate_order(mut self, validate: bool) -> Self {
        self.validate_order = validate;
        self
    }

    pub fn build(self) -> Result<TimeWindow, WindowConfigError> {
        let time_column = self.time_column.ok_or(WindowConfigError::MissingTimeColumn)?;
        let (window_size, window_size_unit) =
            self.window_size.ok_or(WindowConfigError::MissingWindowSize)?;
        let window_size_ms = window_size_unit.as_millis(window_size);
        if window_size_ms <= 0 {
            return Err(WindowConfigError::NonPositiveWindowSize {
                millis: window_size_ms,
            });
        }
        let (offset_amount, offset_unit) = match self.offset {
            Some((amount, unit)) => (amount, Some(unit)),
            None => (0, None),
        };
        let offset_ms = match offset_unit {
            Some(unit) if offset_amount != 0 => unit.as_millis(offset_amount),
            _ => 0,
        };
        Ok(TimeWindow {
            time_column,
            window_size,
            window_size_unit,
            offset_amount,
            offset_unit,
            add_window_start_column: self.add_window_start_column,
            add_window_end_column: self.add_window_end_column,
            exclude_empty_windows: self.exclude_empty_windows,
            validate_order: self.validate_order,
            window_size_ms,
            offset_ms,
        })
    }
}
