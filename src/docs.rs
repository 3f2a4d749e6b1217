use crate::engine::aggregator::MissingDayPolicy;
use crate::model::attendance::{AttendanceDay, AttendanceRecord, BreakPeriod, BreakType};
use crate::model::report::{
    Anomaly, AnomalyKind, AnomalyReport, AttendanceOverview, AttendancePercentage,
    BranchAttendance, DashboardStats, DepartmentPerformance, OverviewSummary,
    PerformanceScoreView,
};
use crate::models::{AbsenceReq, ActionData, ActionResponse, BreakEndReq, BreakStartReq, LocationReq};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance & Time Tracking

Daily attendance for employees of a multi-branch organization.

### 🔹 Key Features
- **Check-in / Check-out**
  - GPS positions validated against the branch geofence
  - Late arrival and early departure against the department shift, with grace periods
- **Breaks**
  - Lunch, prayer, rest and personal breaks deducted from worked hours
- **Reports**
  - Attendance percentage, anomaly runs, per-record performance score
  - Daily dashboard and an organisation overview ranked by branch

### 📦 Response Format
- Success: `{"success": true, "data": ...}`
- Failure: `{"success": false, "message": "..."}` with 400, 404, 409 or 500

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::break_start,
        crate::api::attendance::break_end,
        crate::api::attendance::record_absence,

        crate::api::reports::history,
        crate::api::reports::percentage,
        crate::api::reports::anomalies,
        crate::api::reports::score,
        crate::api::reports::dashboard,
        crate::api::reports::overview
    ),
    components(
        schemas(
            LocationReq,
            BreakStartReq,
            BreakEndReq,
            AbsenceReq,
            ActionData,
            ActionResponse,
            AttendanceRecord,
            AttendanceDay,
            BreakPeriod,
            BreakType,
            AttendancePercentage,
            MissingDayPolicy,
            Anomaly,
            AnomalyKind,
            AnomalyReport,
            PerformanceScoreView,
            DashboardStats,
            OverviewSummary,
            BranchAttendance,
            DepartmentPerformance,
            AttendanceOverview
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance lifecycle APIs"),
        (name = "Reports", description = "Attendance analytics APIs"),
    )
)]
pub struct ApiDoc;
