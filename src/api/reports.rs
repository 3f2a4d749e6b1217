use actix_web::{HttpResponse, Responder, web};
use serde_json::json;

use super::attendance::now;
use crate::error::AttendanceResult;
use crate::models::{DateQuery, DateRangeQuery, LookbackQuery};
use crate::service::AttendanceService;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Attendance history with breaks
#[utoipa::path(
    get,
    path = "/api/attendance/employees/{employee_id}/history",
    params(
        ("employee_id", description = "Employee ID"),
        DateRangeQuery
    ),
    responses(
        (status = 200, description = "Records in the range, oldest first", body = [crate::model::attendance::AttendanceDay]),
        (status = 400, description = "Invalid date range, or more rows than the report cap"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn history(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> AttendanceResult<impl Responder> {
    let days = service
        .history(path.into_inner(), query.start_date, query.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": days })))
}

/// Share of counted days on which the employee was present
#[utoipa::path(
    get,
    path = "/api/attendance/employees/{employee_id}/percentage",
    params(
        ("employee_id", description = "Employee ID"),
        DateRangeQuery
    ),
    responses(
        (status = 200, description = "Attendance percentage", body = crate::model::report::AttendancePercentage),
        (status = 400, description = "Invalid date range, or more rows than the report cap"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn percentage(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> AttendanceResult<impl Responder> {
    let result = service
        .calculate_attendance_percentage(path.into_inner(), query.start_date, query.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result })))
}

/// Runs of consecutive absences or late arrivals
#[utoipa::path(
    get,
    path = "/api/attendance/employees/{employee_id}/anomalies",
    params(
        ("employee_id", description = "Employee ID"),
        LookbackQuery
    ),
    responses(
        (status = 200, description = "Detected anomalies", body = crate::model::report::AnomalyReport),
        (status = 400, description = "Lookback out of range, or more rows than the report cap"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn anomalies(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
    query: web::Query<LookbackQuery>,
) -> AttendanceResult<impl Responder> {
    let lookback = query.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS);
    let report = service
        .detect_anomalies(path.into_inner(), lookback, now().date())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": report })))
}

#[utoipa::path(
    get,
    path = "/api/attendance/records/{attendance_id}/score",
    params(
        ("attendance_id", description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Performance score of one record", body = crate::model::report::PerformanceScoreView),
        (status = 404, description = "Attendance record not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn score(
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> AttendanceResult<impl Responder> {
    let view = service.performance_score(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": view })))
}

/// Counts for a single day across active employees
#[utoipa::path(
    get,
    path = "/api/attendance/dashboard",
    params(DateQuery),
    responses(
        (status = 200, description = "Dashboard counters", body = crate::model::report::DashboardStats),
        (status = 400, description = "More rows than the report cap"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn dashboard(
    service: web::Data<AttendanceService>,
    query: web::Query<DateQuery>,
) -> AttendanceResult<impl Responder> {
    let date = query.date.unwrap_or_else(|| now().date());
    let stats = service.dashboard(date).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": stats })))
}

/// Organisation-wide summary with branch ranking and department performance
#[utoipa::path(
    get,
    path = "/api/attendance/overview",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Attendance overview", body = crate::model::report::AttendanceOverview),
        (status = 400, description = "Invalid date range, or more rows than the report cap"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Reports"
)]
pub async fn overview(
    service: web::Data<AttendanceService>,
    query: web::Query<DateRangeQuery>,
) -> AttendanceResult<impl Responder> {
    let overview = service.overview(query.start_date, query.end_date).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": overview })))
}
