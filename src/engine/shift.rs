use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{AttendanceError, AttendanceResult};
use crate::model::policy::ShiftWindow;

fn grace(minutes: i64) -> AttendanceResult<Duration> {
    if minutes < 0 {
        return Err(AttendanceError::validation(format!(
            "grace period must be >= 0 minutes, got {minutes}"
        )));
    }
    Ok(Duration::minutes(minutes))
}

/// Late iff `check_in` is strictly after `shift_start + grace_minutes`.
pub fn is_late_arrival(
    check_in: NaiveDateTime,
    shift_start: NaiveDateTime,
    grace_minutes: i64,
) -> AttendanceResult<bool> {
    Ok(check_in > shift_start + grace(grace_minutes)?)
}

/// Early iff `check_out` is strictly before `shift_end - grace_minutes`.
pub fn is_early_departure(
    check_out: NaiveDateTime,
    shift_end: NaiveDateTime,
    grace_minutes: i64,
) -> AttendanceResult<bool> {
    Ok(check_out < shift_end - grace(grace_minutes)?)
}

pub fn minutes_late(check_in: NaiveDateTime, shift_start: NaiveDateTime) -> i64 {
    (check_in - shift_start).num_minutes().max(0)
}

pub fn minutes_early(check_out: NaiveDateTime, shift_end: NaiveDateTime) -> i64 {
    (shift_end - check_out).num_minutes().max(0)
}

/// Outcome of comparing one timestamp against a shift boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Punctuality {
    pub flagged: bool,
    pub minutes: i64,
}

impl ShiftWindow {
    pub fn evaluate_arrival(
        &self,
        date: NaiveDate,
        check_in: NaiveDateTime,
    ) -> AttendanceResult<Punctuality> {
        let (start, _) = self.bounds_on(date);
        let flagged = is_late_arrival(check_in, start, self.late_grace_minutes)?;
        Ok(Punctuality {
            flagged,
            minutes: if flagged { minutes_late(check_in, start) } else { 0 },
        })
    }

    pub fn evaluate_departure(
        &self,
        date: NaiveDate,
        check_out: NaiveDateTime,
    ) -> AttendanceResult<Punctuality> {
        let (_, end) = self.bounds_on(date);
        let flagged = is_early_departure(check_out, end, self.early_departure_grace_minutes)?;
        Ok(Punctuality {
            flagged,
            minutes: if flagged { minutes_early(check_out, end) } else { 0 },
        })
    }
}
