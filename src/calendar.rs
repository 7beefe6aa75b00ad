//! Calendar Math: shift-boundary membership, working-minute accounting,
//! and interval intersection. Every timestamp is assumed UTC; no local
//! time zone ever enters this module.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::domain::WorkCenter;

/// Which end of an interval `is_time_in_shift` is testing. The two modes
/// are intentionally asymmetric: a shift that ends at 17:00 and the next
/// one starting at 17:00 must compose into a valid hand-off without the
/// boundary minute being claimed by both or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftEdge {
    Start,
    End,
}

/// Maps an hour-of-day boundary (0..=24) onto a concrete UTC timestamp for
/// the given calendar date. `24` rolls over to midnight of the next day.
pub(crate) fn hour_boundary(day: NaiveDate, hour: u8) -> DateTime<Utc> {
    if hour >= 24 {
        next_midnight(day)
    } else {
        day.and_hms_opt(hour as u32, 0, 0)
            .expect("hour_boundary: hour already checked < 24")
            .and_utc()
    }
}

/// Midnight UTC at the start of the calendar day following `day`.
pub(crate) fn next_midnight(day: NaiveDate) -> DateTime<Utc> {
    day.succ_opt()
        .unwrap_or(day)
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

fn intersect(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if start < end {
        Some((start, end))
    } else {
        None
    }
}

/// True if two half-open intervals `[a_start, a_end)` and `[b_start, b_end)` overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Sunday = 0 .. Saturday = 6, matching the domain model's `day_of_week`.
pub fn day_of_week(t: DateTime<Utc>) -> u8 {
    t.weekday().num_days_from_sunday() as u8
}

/// Is `t` a legal shift boundary for `mode` against any shift in `shifts`?
///
/// `Start`: `t` is legal at `[shift_start, shift_end)`.
/// `End`: `t` is legal at `(shift_start, shift_end]`.
///
/// A shift with `end_hour == 24` rolls its end to the following day's
/// midnight (`hour_boundary`), so checking `End` at that instant must also
/// consider shifts defined on `t`'s *previous* calendar day — otherwise a
/// midnight-ending shift's own end would be filtered out by `day_of_week`.
pub fn is_time_in_shift(t: DateTime<Utc>, shifts: &[crate::domain::Shift], mode: ShiftEdge) -> bool {
    let day = t.date_naive();
    let dow = day_of_week(t);

    let matches_same_day = shifts.iter().filter(|s| s.day_of_week == dow).any(|s| {
        let shift_start = hour_boundary(day, s.start_hour);
        let shift_end = hour_boundary(day, s.end_hour);
        match mode {
            ShiftEdge::Start => t >= shift_start && t < shift_end,
            ShiftEdge::End => t > shift_start && t <= shift_end,
        }
    });
    if matches_same_day || mode == ShiftEdge::Start {
        return matches_same_day;
    }

    let prev_day = day.pred_opt().unwrap_or(day);
    let prev_dow = prev_day.weekday().num_days_from_sunday() as u8;
    shifts.iter().filter(|s| s.day_of_week == prev_dow).any(|s| {
        let shift_start = hour_boundary(prev_day, s.start_hour);
        let shift_end = hour_boundary(prev_day, s.end_hour);
        t > shift_start && t <= shift_end
    })
}

/// Net on-shift, outside-maintenance minutes between `start` and `end` on `wc`.
/// Degenerate inputs (`start >= end`) yield 0.
pub fn working_minutes(start: DateTime<Utc>, end: DateTime<Utc>, wc: &WorkCenter) -> i64 {
    if start >= end {
        return 0;
    }

    let mut total_seconds: i64 = 0;
    let last_day = end.date_naive();
    let mut day = start.date_naive();

    loop {
        let dow = day.weekday().num_days_from_sunday() as u8;
        for shift in wc.shifts.iter().filter(|s| s.day_of_week == dow) {
            let shift_start = hour_boundary(day, shift.start_hour);
            let shift_end = hour_boundary(day, shift.end_hour);
            let Some((slice_start, slice_end)) = intersect(start, end, shift_start, shift_end) else {
                continue;
            };
            let mut slice_seconds = (slice_end - slice_start).num_seconds();
            for window in &wc.maintenance_windows {
                if let Some((ws, we)) = intersect(slice_start, slice_end, window.start, window.end) {
                    slice_seconds -= (we - ws).num_seconds();
                }
            }
            total_seconds += slice_seconds.max(0);
        }

        if day >= last_day {
            break;
        }
        day = day.succ_opt().unwrap_or(last_day);
    }

    let minutes = total_seconds as f64 / 60.0;
    minutes.round() as i64
}
