use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Scheduled working window of a department, with its grace periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ShiftWindow {
    #[schema(value_type = String, example = "09:00:00")]
    pub start: NaiveTime,

    #[schema(value_type = String, example = "17:00:00")]
    pub end: NaiveTime,

    #[schema(example = 15)]
    pub late_grace_minutes: i64,

    #[schema(example = 10)]
    pub early_departure_grace_minutes: i64,
}

impl ShiftWindow {
    /// Scheduled start and end on `date`. An end at or before the start
    /// belongs to the following day.
    pub fn bounds_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.start);
        let mut end = date.and_time(self.end);
        if end <= start {
            end += Duration::days(1);
        }
        (start, end)
    }

    /// The date whose shift `at` belongs to: yesterday while an overnight
    /// shift that started yesterday is still running, otherwise `at`'s own date.
    pub fn shift_date(&self, at: NaiveDateTime) -> NaiveDate {
        let today = at.date();
        if let Some(yesterday) = today.pred_opt() {
            let (start, end) = self.bounds_on(yesterday);
            if start <= at && at < end {
                return yesterday;
            }
        }
        today
    }

    pub fn scheduled_hours(&self) -> f64 {
        let (start, end) = self.bounds_on(NaiveDate::default());
        (end - start).num_minutes() as f64 / 60.0
    }
}

/// Circular area around a branch in which check-ins are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct GeoFence {
    #[schema(example = 24.7136)]
    pub latitude: f64,

    #[schema(example = 46.6753)]
    pub longitude: f64,

    #[schema(example = 100.0)]
    pub radius_meters: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: (u32, u32), end: (u32, u32)) -> ShiftWindow {
        ShiftWindow {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            late_grace_minutes: 15,
            early_departure_grace_minutes: 10,
        }
    }

    #[test]
    fn day_shift_stays_on_the_same_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (start, end) = window((9, 0), (17, 30)).bounds_on(date);
        assert_eq!(start, date.and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(end, date.and_hms_opt(17, 30, 0).unwrap());
        assert_eq!(window((9, 0), (17, 30)).scheduled_hours(), 8.5);
    }

    #[test]
    fn night_shift_ends_the_next_morning() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (_, end) = window((22, 0), (6, 0)).bounds_on(date);
        assert_eq!(end, date.succ_opt().unwrap().and_hms_opt(6, 0, 0).unwrap());
        assert_eq!(window((22, 0), (6, 0)).scheduled_hours(), 8.0);
    }

    #[test]
    fn after_midnight_belongs_to_the_previous_night_shift() {
        let night = window((22, 0), (6, 0));
        let date = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
        let yesterday = date.pred_opt().unwrap();

        assert_eq!(night.shift_date(date.and_hms_opt(0, 30, 0).unwrap()), yesterday);
        assert_eq!(night.shift_date(date.and_hms_opt(5, 59, 0).unwrap()), yesterday);
        assert_eq!(night.shift_date(date.and_hms_opt(6, 0, 0).unwrap()), date);
        assert_eq!(night.shift_date(date.and_hms_opt(22, 0, 0).unwrap()), date);

        let day = window((9, 0), (17, 0));
        assert_eq!(day.shift_date(date.and_hms_opt(0, 30, 0).unwrap()), date);
    }
}
