//! The windowing engine: partition an ordered sequence into fixed windows.

use chrono::{DateTime, Offset};
use chrono_tz::Tz;

use crate::schemaflow::error::ShapeError;
use crate::schemaflow::record::{Record, Sequence, Value};
use crate::schemaflow::schema::Schema;

use super::config::TimeWindow;

/// A [`TimeWindow`] bound to a sequence schema.
///
/// Holds the resolved position of the time column and the timezone captured
/// from it at bind time. Immutable and `Send + Sync`; one bound window can
/// partition any number of sequences concurrently.
#[derive(Debug, Clone)]
pub struct BoundTimeWindow {
    window: TimeWindow,
    input_schema: Schema,
    output_schema: Schema,
    time_index: usize,
    timezone: Tz,
}

impl BoundTimeWindow {
    pub(super) fn new(
        window: TimeWindow,
        input_schema: Schema,
        output_schema: Schema,
        time_index: usize,
        timezone: Tz,
    ) -> Self {
        BoundTimeWindow {
            window,
            input_schema,
            output_schema,
            time_index,
            timezone,
        }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// The timezone captured from the time column at bind time.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn window_size_ms(&self) -> i64 {
        self.window.window_size_ms()
    }

    pub fn offset_ms(&self) -> i64 {
        self.window.offset_ms()
    }

    /// The timezone's UTC offset at the given instant, in milliseconds.
    ///
    /// Queried per instant, so daylight saving transitions shift window
    /// boundaries the way local clocks do. Instants outside chrono's
    /// representable range carry an offset of zero.
    fn timezone_offset_ms(&self, instant: i64) -> i64 {
        match DateTime::from_timestamp_millis(instant) {
            Some(utc) => {
                i64::from(utc.with_timezone(&self.timezone).offset().fix().local_minus_utc())
                    * 1_000
            }
            None => 0,
        }
    }

    /// The start of the window the given instant falls into, in epoch
    /// milliseconds.
    ///
    /// Start times T satisfy `(T + timezoneOffset + offset) % windowSize == 0`;
    /// for example, 1 hour windows with zero offset in UTC put 10:17 into the
    /// window starting at 10:00. Two instants are in the same window exactly
    /// when this function returns the same value for both.
    pub fn window_start_for(&self, time: i64) -> i64 {
        let aggregate_offset =
            (self.timezone_offset_ms(time) + self.window.offset_ms()) % self.window.window_size_ms();
        (time + aggregate_offset) - (time + aggregate_offset) % self.window.window_size_ms()
    }

    /// The exclusive end of the window the given instant falls into. Equal to
    /// [`window_start_for`](BoundTimeWindow::window_start_for) plus the window
    /// size; the last included instant is one millisecond earlier.
    pub fn window_end_for(&self, time: i64) -> i64 {
        self.window_start_for(time) + self.window.window_size_ms()
    }

    /// Partition one ordered sequence into windows.
    ///
    /// A single pass over the records. A window closes when a record lands in
    /// a later window; any intermediate windows with no records are emitted
    /// empty unless the configuration excludes them. Empty windows are
    /// legitimate output: a sequence spanning three hours with data only in
    /// the first and last hour yields three one-hour windows, the middle one
    /// empty. An empty input sequence yields no windows at all.
    ///
    /// When start/end columns are configured, each record gains the enclosing
    /// window's boundaries as trailing `Time` values in the captured timezone.
    pub fn apply_to_sequence(&self, sequence: &Sequence) -> Result<Vec<Sequence>, ShapeError> {
        let add_start = self.window.add_window_start_column();
        let add_end = self.window.add_window_end_column();
        let exclude_empty = self.window.exclude_empty_windows();
        let size = self.window.window_size_ms();

        let mut out: Vec<Sequence> = Vec::new();
        let mut current_start: Option<i64> = None;
        let mut current_window: Vec<Record> = Vec::new();
        let mut previous_time: Option<i64> = None;

        for (position, record) in sequence.iter().enumerate() {
            self.input_schema.validate(record)?;
            let time = record.values()[self.time_index].to_long().ok_or_else(|| {
                ShapeError::TypeMismatch {
                    column: self.window.time_column().to_string(),
                    expected: "TIME".to_string(),
                    actual: record.values()[self.time_index].type_name().to_string(),
                }
            })?;
            if self.window.validate_order() {
                if let Some(previous) = previous_time {
                    if time < previous {
                        return Err(ShapeError::OutOfOrderSequence {
                            position,
                            time,
                            previous,
                        });
                    }
                }
                previous_time = Some(time);
            }

            let step_start = self.window_start_for(time);
            let start = match current_start {
                None => {
                    current_start = Some(step_start);
                    step_start
                }
                Some(mut start) => {
                    // A later window closes the current one; any skipped
                    // windows in between are emitted empty.
                    while start < step_start {
                        let closed = std::mem::take(&mut current_window);
                        if !(exclude_empty && closed.is_empty()) {
                            out.push(Sequence::from(closed));
                        }
                        start += size;
                    }
                    current_start = Some(start);
                    start
                }
            };

            if add_start || add_end {
                let mut step = record.clone();
                if add_start {
                    step.push(Value::Time(start, self.timezone));
                }
                if add_end {
                    step.push(Value::Time(start + size, self.timezone));
                }
                current_window.push(step);
            } else {
                current_window.push(record.clone());
            }
        }

        // flush the final window
        if current_start.is_some() && !(exclude_empty && current_window.is_empty()) {
            out.push(Sequence::from(current_window));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemaflow::schema::{ColumnDef, ColumnType};
    use crate::schemaflow::window::TimeUnit;

    const HOUR_MS: i64 = 3_600_000;
    const MINUTE_MS: i64 = 60_000;

    fn hm(hours: i64, minutes: i64) -> i64 {
        hours * HOUR_MS + minutes * MINUTE_MS
    }

    fn sequence_schema(tz: Tz) -> Schema {
        Schema::builder()
            .time("ts", tz)
            .long("v")
            .build_sequence()
            .unwrap()
    }

    fn step(tz: Tz, time: i64, v: i64) -> Record {
        Record::from(vec![Value::Time(time, tz), Value::Long(v)])
    }

    fn hourly(tz: Tz) -> BoundTimeWindow {
        TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Hours)
            .build()
            .unwrap()
            .bind(&sequence_schema(tz))
            .unwrap()
    }

    #[test]
    fn test_instants_in_the_same_hour_share_a_window_start() {
        let window = hourly(Tz::UTC);
        assert_eq!(window.window_start_for(hm(10, 5)), hm(10, 0));
        assert_eq!(window.window_start_for(hm(10, 59)), hm(10, 0));
        assert_eq!(window.window_start_for(hm(11, 0)), hm(11, 0));
        assert_eq!(window.window_end_for(hm(10, 5)), hm(11, 0));
    }

    #[test]
    fn test_an_offset_shifts_the_boundaries() {
        let window = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Hours)
            .offset(15, TimeUnit::Minutes)
            .build()
            .unwrap()
            .bind(&sequence_schema(Tz::UTC))
            .unwrap();
        // boundaries sit at :45 instead of :00
        assert_eq!(
            window.window_start_for(hm(9, 50)),
            window.window_start_for(hm(10, 5))
        );
        assert_eq!(
            window.window_start_for(hm(10, 44)),
            window.window_start_for(hm(10, 5))
        );
        assert_ne!(
            window.window_start_for(hm(10, 45)),
            window.window_start_for(hm(10, 44))
        );
    }

    #[test]
    fn test_daily_windows_follow_the_columns_timezone() {
        let ny: Tz = "America/New_York".parse().unwrap();
        let daily = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Days)
            .build()
            .unwrap()
            .bind(&sequence_schema(ny))
            .unwrap();

        // 2021-01-15 03:00/04:59/05:00 UTC; New York is UTC-5, so the first
        // two are still Jan 14 locally while the third starts Jan 15
        let jan15_utc_midnight = 1_610_668_800_000;
        let t1 = jan15_utc_midnight + hm(3, 0);
        let t2 = jan15_utc_midnight + hm(4, 59);
        let t3 = jan15_utc_midnight + hm(5, 0);
        assert_eq!(daily.window_start_for(t1), daily.window_start_for(t2));
        assert_ne!(daily.window_start_for(t2), daily.window_start_for(t3));

        // the same instants share a UTC calendar day
        let utc_daily = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Days)
            .build()
            .unwrap()
            .bind(&sequence_schema(Tz::UTC))
            .unwrap();
        assert_eq!(utc_daily.window_start_for(t2), utc_daily.window_start_for(t3));
    }

    #[test]
    fn test_consecutive_records_group_into_two_windows() {
        let window = hourly(Tz::UTC);
        let sequence = Sequence::from(vec![
            step(Tz::UTC, hm(10, 5), 1),
            step(Tz::UTC, hm(10, 40), 2),
            step(Tz::UTC, hm(11, 10), 3),
        ]);
        let windows = window.apply_to_sequence(&sequence).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].len(), 2);
        assert_eq!(windows[1].len(), 1);
    }

    #[test]
    fn test_a_gap_produces_an_empty_intermediate_window() {
        let window = hourly(Tz::UTC);
        let sequence = Sequence::from(vec![
            step(Tz::UTC, hm(10, 5), 1),
            step(Tz::UTC, hm(12, 10), 2),
        ]);
        let windows = window.apply_to_sequence(&sequence).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].len(), 1);
        assert!(windows[1].is_empty());
        assert_eq!(windows[2].len(), 1);
    }

    #[test]
    fn test_empty_windows_can_be_excluded() {
        let window = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Hours)
            .exclude_empty_windows(true)
            .build()
            .unwrap()
            .bind(&sequence_schema(Tz::UTC))
            .unwrap();
        let sequence = Sequence::from(vec![
            step(Tz::UTC, hm(10, 5), 1),
            step(Tz::UTC, hm(12, 10), 2),
        ]);
        let windows = window.apply_to_sequence(&sequence).unwrap();
        assert_eq!(windows.len(), 2);
        assert!(windows.iter().all(|w| !w.is_empty()));
    }

    #[test]
    fn test_single_record_sequences_yield_exactly_one_window() {
        let window = hourly(Tz::UTC);
        let windows = window
            .apply_to_sequence(&Sequence::from(vec![step(Tz::UTC, hm(3, 30), 7)]))
            .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 1);
    }

    #[test]
    fn test_empty_sequences_yield_no_windows() {
        let window = hourly(Tz::UTC);
        assert!(window.apply_to_sequence(&Sequence::new()).unwrap().is_empty());
    }

    #[test]
    fn test_boundary_columns_carry_start_then_end() {
        let window = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Hours)
            .add_window_start_column(true)
            .add_window_end_column(true)
            .build()
            .unwrap()
            .bind(&sequence_schema(Tz::UTC))
            .unwrap();
        let windows = window
            .apply_to_sequence(&Sequence::from(vec![step(Tz::UTC, hm(10, 5), 1)]))
            .unwrap();
        let record = &windows[0].records()[0];
        assert_eq!(record.len(), 4);
        assert_eq!(record.get(2), Some(&Value::Time(hm(10, 0), Tz::UTC)));
        assert_eq!(record.get(3), Some(&Value::Time(hm(11, 0), Tz::UTC)));
        assert!(window.output_schema().validate(record).is_ok());
    }

    #[test]
    fn test_order_validation_is_opt_in() {
        let backwards = Sequence::from(vec![
            step(Tz::UTC, hm(10, 30), 1),
            step(Tz::UTC, hm(10, 5), 2),
        ]);

        // permissive by default: both land in the 10:00 window
        let lenient = hourly(Tz::UTC);
        let windows = lenient.apply_to_sequence(&backwards).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].len(), 2);

        let strict = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Hours)
            .validate_order(true)
            .build()
            .unwrap()
            .bind(&sequence_schema(Tz::UTC))
            .unwrap();
        assert_eq!(
            strict.apply_to_sequence(&backwards),
            Err(ShapeError::OutOfOrderSequence {
                position: 1,
                time: hm(10, 5),
                previous: hm(10, 30),
            })
        );
    }

    #[test]
    fn test_null_time_values_are_reported_not_skipped() {
        let schema = Schema::builder()
            .column(ColumnDef::nullable(
                "ts",
                ColumnType::Time { timezone: Tz::UTC },
            ))
            .long("v")
            .build_sequence()
            .unwrap();
        let window = TimeWindow::builder()
            .time_column("ts")
            .window_size(1, TimeUnit::Hours)
            .build()
            .unwrap()
            .bind(&schema)
            .unwrap();
        let sequence = Sequence::from(vec![Record::from(vec![Value::Null, Value::Long(1)])]);
        assert!(matches!(
            window.apply_to_sequence(&sequence),
            Err(ShapeError::TypeMismatch { .. })
        ));
    }
}
