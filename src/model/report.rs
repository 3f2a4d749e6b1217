use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::engine::aggregator::MissingDayPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 1001,
    "start_date": "2026-01-01",
    "end_date": "2026-01-31",
    "recorded_days": 20,
    "present_days": 10,
    "percentage": 50.0,
    "missing_day_policy": "exclude",
    "empty": false
}))]
pub struct AttendancePercentage {
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// Days counted in the denominator.
    pub recorded_days: u32,
    pub present_days: u32,
    pub percentage: f64,
    pub missing_day_policy: MissingDayPolicy,
    /// True when nothing in the range could be counted.
    pub empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnomalyKind {
    ConsecutiveAbsence,
    ConsecutiveLateArrival,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    pub run_length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AnomalyReport {
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub window_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub window_end: NaiveDate,
    pub records_scanned: u32,
    pub anomalies: Vec<Anomaly>,
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PerformanceScoreView {
    pub attendance_id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 100)]
    pub score: u8,
    pub is_late: bool,
    pub is_early_departure: bool,
    pub overtime_hours: f64,
}

/// Manager view of a single day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "date": "2026-01-05",
    "total_employees": 42,
    "present_today": 38,
    "absent_today": 4,
    "late_today": 3,
    "on_break_now": 5,
    "checked_out_today": 12
}))]
pub struct DashboardStats {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_employees: u32,
    pub present_today: u32,
    pub absent_today: u32,
    pub late_today: u32,
    pub on_break_now: u32,
    pub checked_out_today: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OverviewSummary {
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub total_employees: u32,
    pub total_records: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub late_days: u32,
    pub attendance_rate: f64,
    pub average_score: f64,
    pub empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BranchAttendance {
    pub rank: u32,
    pub branch_id: u64,
    pub branch_name: String,
    pub employees: u32,
    pub recorded_days: u32,
    pub present_days: u32,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DepartmentPerformance {
    pub department_id: u64,
    pub department_name: String,
    pub records: u32,
    pub average_score: f64,
    pub late_count: u32,
    pub early_departure_count: u32,
    pub overtime_hours: f64,
}

/// Admin view over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AttendanceOverview {
    pub summary: OverviewSummary,
    pub attendance_by_branch: Vec<BranchAttendance>,
    pub department_performance: Vec<DepartmentPerformance>,
}
