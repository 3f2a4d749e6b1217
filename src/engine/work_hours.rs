use chrono::NaiveDateTime;

use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::BreakPeriod;

/// Net hours between `check_in` and `check_out` after removing breaks.
///
/// Never negative: breaks longer than the span yield 0. A check-out before
/// the check-in or negative break minutes are rejected.
pub fn calculate_total_work_hours(
    check_in: NaiveDateTime,
    check_out: NaiveDateTime,
    break_minutes: i64,
) -> AttendanceResult<f64> {
    if check_out < check_in {
        return Err(AttendanceError::validation(format!(
            "check-out {check_out} precedes check-in {check_in}"
        )));
    }
    if break_minutes < 0 {
        return Err(AttendanceError::validation(format!(
            "break minutes must be >= 0, got {break_minutes}"
        )));
    }

    let gross_minutes = (check_out - check_in).num_seconds() as f64 / 60.0;
    let net_minutes = (gross_minutes - break_minutes as f64).max(0.0);
    Ok(net_minutes / 60.0)
}

pub fn calculate_overtime(worked_hours: f64, expected_hours: f64) -> f64 {
    (worked_hours - expected_hours).max(0.0)
}

/// Total minutes of all finished breaks. Open breaks are not counted.
pub fn total_break_minutes(breaks: &[BreakPeriod]) -> i64 {
    breaks.iter().filter_map(BreakPeriod::minutes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::BreakType;
    use chrono::{Duration, Local};

    fn base() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn eight_and_a_half_hours_minus_half_hour_break_is_eight() {
        let now = Local::now().naive_local();
        let check_in = now - Duration::minutes(8 * 60 + 30);
        assert_eq!(calculate_total_work_hours(check_in, now, 30).unwrap(), 8.0);
    }

    #[test]
    fn overtime_is_the_excess_over_expected() {
        assert_eq!(calculate_overtime(9.0, 8.0), 1.0);
        assert_eq!(calculate_overtime(8.0, 8.0), 0.0);
        assert_eq!(calculate_overtime(6.5, 8.0), 0.0);
        assert_eq!(calculate_overtime(10.5, 8.0), 2.5);
    }

    #[test]
    fn work_hours_grow_with_span_and_shrink_with_breaks() {
        let mut previous = -1.0;
        for span in (60..=720).step_by(30) {
            let hours = calculate_total_work_hours(base(), base() + Duration::minutes(span), 30).unwrap();
            assert!(hours >= previous, "span {span}");
            previous = hours;
        }

        let mut previous = f64::MAX;
        for breaks in (0..=120).step_by(15) {
            let hours = calculate_total_work_hours(base(), base() + Duration::hours(9), breaks).unwrap();
            assert!(hours <= previous, "breaks {breaks}");
            previous = hours;
        }
    }

    #[test]
    fn breaks_longer_than_the_span_floor_at_zero() {
        let hours = calculate_total_work_hours(base(), base() + Duration::minutes(20), 45).unwrap();
        assert_eq!(hours, 0.0);
    }

    #[test]
    fn check_out_before_check_in_is_a_validation_error() {
        let err = calculate_total_work_hours(base(), base() - Duration::minutes(1), 0).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[test]
    fn negative_breaks_are_rejected() {
        let err = calculate_total_work_hours(base(), base() + Duration::hours(1), -5).unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }

    #[test]
    fn only_finished_breaks_are_summed() {
        let period = |start: i64, end: Option<i64>| BreakPeriod {
            id: 0,
            attendance_id: 1,
            break_type: BreakType::Rest,
            started_at: base() + Duration::minutes(start),
            ended_at: end.map(|e| base() + Duration::minutes(e)),
        };
        let breaks = vec![period(60, Some(90)), period(200, Some(215)), period(300, None)];
        assert_eq!(total_break_minutes(&breaks), 45);
    }
}
