use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDateTime};

use crate::error::AttendanceResult;
use crate::models::{AbsenceReq, ActionResponse, BreakEndReq, BreakStartReq, LocationReq};
use crate::service::AttendanceService;

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = LocationReq,
    responses(
        (status = 201, description = "Checked in successfully", body = crate::models::ActionResponse),
        (status = 400, description = "Invalid coordinates or outside the branch geofence", body = Object, example = json!({
            "success": false,
            "message": "Location is outside the permitted area of branch 1"
        })),
        (status = 404, description = "Unknown employee or no shift configured"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "success": false,
            "message": "Already checked in today"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    service: web::Data<AttendanceService>,
    body: web::Json<LocationReq>,
) -> AttendanceResult<impl Responder> {
    let record = service
        .check_in(body.employee_id, body.location(), now())
        .await?;
    Ok(HttpResponse::Created().json(ActionResponse::new(record, "Checked in successfully")))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    request_body = LocationReq,
    responses(
        (status = 200, description = "Checked out successfully", body = crate::models::ActionResponse),
        (status = 400, description = "Invalid coordinates or outside the branch geofence"),
        (status = 404, description = "Unknown employee or no shift configured"),
        (status = 409, description = "No active check-in found for today", body = Object, example = json!({
            "success": false,
            "message": "No active check-in found for today"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    service: web::Data<AttendanceService>,
    body: web::Json<LocationReq>,
) -> AttendanceResult<impl Responder> {
    let record = service
        .check_out(body.employee_id, body.location(), now())
        .await?;
    Ok(HttpResponse::Ok().json(ActionResponse::new(record, "Checked out successfully")))
}

#[utoipa::path(
    post,
    path = "/api/attendance/break/start",
    request_body = BreakStartReq,
    responses(
        (status = 201, description = "Break started", body = crate::models::ActionResponse),
        (status = 404, description = "Unknown employee"),
        (status = 409, description = "Not checked in, or a break is already running"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn break_start(
    service: web::Data<AttendanceService>,
    body: web::Json<BreakStartReq>,
) -> AttendanceResult<impl Responder> {
    let (record, period) = service
        .start_break(body.employee_id, body.break_type, now())
        .await?;
    Ok(HttpResponse::Created()
        .json(ActionResponse::new(record, "Break started").with_break(period)))
}

#[utoipa::path(
    post,
    path = "/api/attendance/break/end",
    request_body = BreakEndReq,
    responses(
        (status = 200, description = "Break ended", body = crate::models::ActionResponse),
        (status = 404, description = "Unknown employee"),
        (status = 409, description = "No break in progress"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn break_end(
    service: web::Data<AttendanceService>,
    body: web::Json<BreakEndReq>,
) -> AttendanceResult<impl Responder> {
    let (record, period) = service.end_break(body.employee_id, now()).await?;
    Ok(HttpResponse::Ok().json(ActionResponse::new(record, "Break ended").with_break(period)))
}

/// Record an absence for a past or current day
#[utoipa::path(
    post,
    path = "/api/attendance/absence",
    request_body = AbsenceReq,
    responses(
        (status = 201, description = "Absence recorded", body = crate::models::ActionResponse),
        (status = 400, description = "Date is in the future"),
        (status = 404, description = "Unknown employee"),
        (status = 409, description = "Attendance for that day already exists"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn record_absence(
    service: web::Data<AttendanceService>,
    body: web::Json<AbsenceReq>,
) -> AttendanceResult<impl Responder> {
    let today = now().date();
    let date = body.date.unwrap_or(today);
    let record = service.record_absence(body.employee_id, date, today).await?;
    Ok(HttpResponse::Created().json(ActionResponse::new(record, "Absence recorded")))
}
