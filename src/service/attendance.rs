use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::config::AttendancePolicy;
use crate::engine::geofence::validate_coordinate;
use crate::engine::work_hours::{calculate_overtime, calculate_total_work_hours, total_break_minutes};
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::{AttendanceRecord, AttendanceState, BreakPeriod, BreakType};
use crate::model::employee::EmployeeProfile;
use crate::model::policy::ShiftWindow;
use crate::repository::{AttendanceRepository, DirectoryRepository};

/// Observed GPS position of a check-in or check-out.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct Location {
    #[schema(example = 24.7136)]
    pub latitude: f64,
    #[schema(example = 46.6753)]
    pub longitude: f64,
}

/// The employee-day an action applies to, with its breaks.
struct ActiveDay {
    record: AttendanceRecord,
    breaks: Vec<BreakPeriod>,
}

impl ActiveDay {
    fn open_break(&self) -> Option<&BreakPeriod> {
        self.breaks.iter().find(|b| b.is_open())
    }

    /// The record's own date acts as "today": an overnight shift carried
    /// into the next calendar day is still open.
    fn state(&self) -> AttendanceState {
        self.record
            .state(self.open_break().is_some(), self.record.date)
    }
}

/// Attendance engine entry point: runs the per-day state machine and the
/// reports over injected repositories and an explicit policy.
pub struct AttendanceService {
    pub(crate) records: Arc<dyn AttendanceRepository>,
    pub(crate) directory: Arc<dyn DirectoryRepository>,
    pub(crate) policy: AttendancePolicy,
}

impl AttendanceService {
    pub fn new(
        records: Arc<dyn AttendanceRepository>,
        directory: Arc<dyn DirectoryRepository>,
        policy: AttendancePolicy,
    ) -> Self {
        Self {
            records,
            directory,
            policy,
        }
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    pub(crate) async fn employee(&self, employee_id: u64) -> AttendanceResult<EmployeeProfile> {
        let employee = self
            .directory
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Employee {employee_id} not found")))?;

        if !employee.is_active {
            return Err(AttendanceError::validation(format!(
                "Employee {employee_id} is not active"
            )));
        }
        Ok(employee)
    }

    async fn shift_for(&self, employee: &EmployeeProfile) -> AttendanceResult<ShiftWindow> {
        self.directory
            .department_shift(employee.department_id)
            .await?
            .ok_or_else(|| {
                AttendanceError::not_found(format!(
                    "No shift policy configured for department {}",
                    employee.department_id
                ))
            })
    }

    /// Geofence verdict for `location`: `None` when the branch has no fence.
    async fn locate(
        &self,
        employee: &EmployeeProfile,
        location: Location,
    ) -> AttendanceResult<Option<bool>> {
        let Some(fence) = self.directory.branch_geofence(employee.branch_id).await? else {
            validate_coordinate(location.latitude, location.longitude)?;
            return Ok(None);
        };

        let inside = fence.contains(location.latitude, location.longitude)?;
        if !inside {
            warn!(
                employee_id = employee.id,
                branch_id = employee.branch_id,
                latitude = location.latitude,
                longitude = location.longitude,
                "Location outside branch geofence"
            );
            if self.policy.enforce_geofence {
                return Err(AttendanceError::validation(format!(
                    "Location is outside the permitted area of branch {}",
                    employee.branch_name
                )));
            }
        }
        Ok(Some(inside))
    }

    /// Today's record, or yesterday's still-open record when the shift runs
    /// past midnight.
    async fn active_day(
        &self,
        employee_id: u64,
        shift: &ShiftWindow,
        now: NaiveDateTime,
    ) -> AttendanceResult<Option<ActiveDay>> {
        let today = now.date();
        let mut record = self.records.find_for_day(employee_id, today).await?;

        if record.is_none() {
            if let Some(yesterday) = today.pred_opt() {
                let (_, shift_end) = shift.bounds_on(yesterday);
                if shift_end.date() > yesterday {
                    record = self
                        .records
                        .find_for_day(employee_id, yesterday)
                        .await?
                        .filter(|r| r.check_in.is_some() && r.check_out.is_none() && !r.is_absent);
                }
            }
        }

        let Some(record) = record else {
            return Ok(None);
        };
        let breaks = self.records.breaks_for(record.id).await?;
        Ok(Some(ActiveDay { record, breaks }))
    }

    fn no_check_in() -> AttendanceError {
        AttendanceError::conflict("No active check-in found for today")
    }

    fn closed(record: &AttendanceRecord) -> AttendanceError {
        AttendanceError::conflict(format!("Attendance for {} is already closed", record.date))
    }

    #[instrument(name = "attendance_check_in", skip(self, location))]
    pub async fn check_in(
        &self,
        employee_id: u64,
        location: Location,
        now: NaiveDateTime,
    ) -> AttendanceResult<AttendanceRecord> {
        let employee = self.employee(employee_id).await?;
        let shift = self.shift_for(&employee).await?;
        // after midnight, an overnight shift still belongs to the day it started
        let date = shift.shift_date(now);

        if self.records.find_for_day(employee_id, date).await?.is_some() {
            return Err(AttendanceError::conflict("Already checked in today"));
        }

        let within = self.locate(&employee, location).await?;
        let arrival = shift.evaluate_arrival(date, now)?;

        let mut record = AttendanceRecord::new(employee_id, date);
        record.check_in = Some(now);
        record.check_in_latitude = Some(location.latitude);
        record.check_in_longitude = Some(location.longitude);
        record.check_in_within_geofence = within;
        record.is_present = true;
        record.is_late = arrival.flagged;
        record.late_minutes = arrival.minutes;

        let record = self.records.insert(record).await?;
        info!(
            attendance_id = record.id,
            is_late = record.is_late,
            late_minutes = record.late_minutes,
            "Checked in"
        );
        Ok(record)
    }

    #[instrument(name = "attendance_break_start", skip(self))]
    pub async fn start_break(
        &self,
        employee_id: u64,
        break_type: BreakType,
        now: NaiveDateTime,
    ) -> AttendanceResult<(AttendanceRecord, BreakPeriod)> {
        let employee = self.employee(employee_id).await?;
        let shift = self.shift_for(&employee).await?;
        let day = self
            .active_day(employee_id, &shift, now)
            .await?
            .ok_or_else(Self::no_check_in)?;

        match day.state() {
            AttendanceState::CheckedIn => {}
            AttendanceState::OnBreak => {
                return Err(AttendanceError::conflict("A break is already in progress"));
            }
            AttendanceState::NoRecord => return Err(Self::no_check_in()),
            AttendanceState::CheckedOut | AttendanceState::Closed => {
                return Err(Self::closed(&day.record));
            }
        }

        if day.record.check_in.is_some_and(|check_in| now < check_in) {
            return Err(AttendanceError::validation("Break cannot start before check-in"));
        }

        let period = self
            .records
            .insert_break(BreakPeriod {
                id: 0,
                attendance_id: day.record.id,
                break_type,
                started_at: now,
                ended_at: None,
            })
            .await?;

        info!(attendance_id = day.record.id, break_id = period.id, %break_type, "Break started");
        Ok((day.record, period))
    }

    #[instrument(name = "attendance_break_end", skip(self))]
    pub async fn end_break(
        &self,
        employee_id: u64,
        now: NaiveDateTime,
    ) -> AttendanceResult<(AttendanceRecord, BreakPeriod)> {
        let employee = self.employee(employee_id).await?;
        let shift = self.shift_for(&employee).await?;
        let mut day = self
            .active_day(employee_id, &shift, now)
            .await?
            .ok_or_else(Self::no_check_in)?;

        match day.state() {
            AttendanceState::OnBreak => {}
            AttendanceState::CheckedIn => {
                return Err(AttendanceError::conflict("No break in progress"));
            }
            AttendanceState::NoRecord => return Err(Self::no_check_in()),
            AttendanceState::CheckedOut | AttendanceState::Closed => {
                return Err(Self::closed(&day.record));
            }
        }

        let period = Self::finish_open_break(&mut day, now)?;
        self.records.update_break(&period).await?;

        day.record.total_break_minutes = total_break_minutes(&day.breaks);
        self.records.update_open(&day.record).await?;

        info!(
            attendance_id = day.record.id,
            break_id = period.id,
            total_break_minutes = day.record.total_break_minutes,
            "Break ended"
        );
        Ok((day.record, period))
    }

    fn finish_open_break(day: &mut ActiveDay, now: NaiveDateTime) -> AttendanceResult<BreakPeriod> {
        let period = day
            .breaks
            .iter_mut()
            .find(|b| b.is_open())
            .ok_or_else(|| AttendanceError::conflict("No break in progress"))?;

        if now < period.started_at {
            return Err(AttendanceError::validation(format!(
                "Break end {now} precedes its start {}",
                period.started_at
            )));
        }
        period.ended_at = Some(now);
        Ok(period.clone())
    }

    #[instrument(name = "attendance_check_out", skip(self, location))]
    pub async fn check_out(
        &self,
        employee_id: u64,
        location: Location,
        now: NaiveDateTime,
    ) -> AttendanceResult<AttendanceRecord> {
        let employee = self.employee(employee_id).await?;
        let shift = self.shift_for(&employee).await?;
        let mut day = self
            .active_day(employee_id, &shift, now)
            .await?
            .ok_or_else(Self::no_check_in)?;

        let state = day.state();
        match state {
            AttendanceState::CheckedIn | AttendanceState::OnBreak => {}
            AttendanceState::NoRecord => return Err(Self::no_check_in()),
            AttendanceState::CheckedOut | AttendanceState::Closed => {
                return Err(Self::closed(&day.record));
            }
        }

        let check_in = day.record.check_in.ok_or_else(Self::no_check_in)?;
        if now < check_in {
            return Err(AttendanceError::validation(format!(
                "Check-out {now} precedes check-in {check_in}"
            )));
        }

        let within = self.locate(&employee, location).await?;

        // an open break ends with the day
        let closed_break = if state == AttendanceState::OnBreak {
            Some(Self::finish_open_break(&mut day, now)?)
        } else {
            None
        };

        let break_minutes = total_break_minutes(&day.breaks);
        let worked = calculate_total_work_hours(check_in, now, break_minutes)?;
        let departure = shift.evaluate_departure(day.record.date, now)?;

        let record = &mut day.record;
        record.check_out = Some(now);
        record.check_out_latitude = Some(location.latitude);
        record.check_out_longitude = Some(location.longitude);
        record.check_out_within_geofence = within;
        record.total_break_minutes = break_minutes;
        record.total_work_hours = worked;
        record.overtime_hours = calculate_overtime(worked, self.policy.expected_work_hours);
        record.is_early_departure = departure.flagged;
        record.early_departure_minutes = departure.minutes;

        if let Some(period) = &closed_break {
            self.records.update_break(period).await?;
        }
        self.records.update_open(&day.record).await?;

        info!(
            attendance_id = day.record.id,
            total_work_hours = day.record.total_work_hours,
            overtime_hours = day.record.overtime_hours,
            is_early_departure = day.record.is_early_departure,
            "Checked out"
        );
        Ok(day.record)
    }

    /// Marks `date` as an absence for the employee. Future dates are rejected.
    #[instrument(name = "attendance_record_absence", skip(self))]
    pub async fn record_absence(
        &self,
        employee_id: u64,
        date: NaiveDate,
        today: NaiveDate,
    ) -> AttendanceResult<AttendanceRecord> {
        if date > today {
            return Err(AttendanceError::validation(format!(
                "Cannot record an absence for future date {date}"
            )));
        }
        self.employee(employee_id).await?;

        if self.records.find_for_day(employee_id, date).await?.is_some() {
            return Err(AttendanceError::conflict(format!(
                "Attendance for {date} already exists"
            )));
        }

        let mut record = AttendanceRecord::new(employee_id, date);
        record.is_absent = true;
        let record = self.records.insert(record).await?;

        info!(attendance_id = record.id, %date, "Absence recorded");
        Ok(record)
    }
}
