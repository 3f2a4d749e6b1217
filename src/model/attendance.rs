use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": 1001,
        "date": "2026-01-05",
        "check_in": "2026-01-05T09:03:00",
        "check_out": "2026-01-05T17:31:00",
        "check_in_latitude": 24.7136,
        "check_in_longitude": 46.6753,
        "check_in_within_geofence": true,
        "check_out_latitude": 24.7136,
        "check_out_longitude": 46.6753,
        "check_out_within_geofence": true,
        "total_break_minutes": 30,
        "total_work_hours": 7.97,
        "overtime_hours": 0.0,
        "late_minutes": 3,
        "early_departure_minutes": 0,
        "is_late": false,
        "is_early_departure": false,
        "is_absent": false,
        "is_present": true
    })
)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,

    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,

    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub check_in_within_geofence: Option<bool>,
    pub check_out_latitude: Option<f64>,
    pub check_out_longitude: Option<f64>,
    pub check_out_within_geofence: Option<bool>,

    pub total_break_minutes: i64,
    pub total_work_hours: f64,
    pub overtime_hours: f64,

    /// Minutes after the scheduled start, 0 when on time or early.
    pub late_minutes: i64,
    /// Minutes before the scheduled end, 0 when leaving on time or later.
    pub early_departure_minutes: i64,

    pub is_late: bool,
    pub is_early_departure: bool,
    pub is_absent: bool,
    pub is_present: bool,
}

impl AttendanceRecord {
    /// A fresh, unsaved record for `employee_id` on `date`. Storage assigns the id.
    pub fn new(employee_id: u64, date: NaiveDate) -> Self {
        Self {
            id: 0,
            employee_id,
            date,
            check_in: None,
            check_out: None,
            check_in_latitude: None,
            check_in_longitude: None,
            check_in_within_geofence: None,
            check_out_latitude: None,
            check_out_longitude: None,
            check_out_within_geofence: None,
            total_break_minutes: 0,
            total_work_hours: 0.0,
            overtime_hours: 0.0,
            late_minutes: 0,
            early_departure_minutes: 0,
            is_late: false,
            is_early_departure: false,
            is_absent: false,
            is_present: false,
        }
    }

    /// Where this record sits in the day's lifecycle.
    ///
    /// `on_break` tells whether an open break exists for the record; `today`
    /// decides whether a past day is closed for mutation.
    pub fn state(&self, on_break: bool, today: NaiveDate) -> AttendanceState {
        if self.date < today || self.is_absent {
            return AttendanceState::Closed;
        }
        match (self.check_in, self.check_out) {
            (_, Some(_)) => AttendanceState::CheckedOut,
            (Some(_), None) if on_break => AttendanceState::OnBreak,
            (Some(_), None) => AttendanceState::CheckedIn,
            (None, None) => AttendanceState::NoRecord,
        }
    }
}

/// Lifecycle of a single employee-day.
///
/// `NoRecord -> CheckedIn -> (OnBreak <-> CheckedIn)* -> CheckedOut -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceState {
    NoRecord,
    CheckedIn,
    OnBreak,
    CheckedOut,
    Closed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BreakType {
    Lunch,
    Prayer,
    Rest,
    Personal,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BreakPeriod {
    pub id: u64,
    pub attendance_id: u64,
    pub break_type: BreakType,
    #[schema(value_type = String, format = "date-time")]
    pub started_at: NaiveDateTime,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub ended_at: Option<NaiveDateTime>,
}

impl BreakPeriod {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Whole minutes spent on the break, `None` while it is still running.
    pub fn minutes(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_minutes().max(0))
    }
}

/// A record together with its breaks, as returned by history queries.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceDay {
    pub attendance: AttendanceRecord,
    pub breaks: Vec<BreakPeriod>,
}
