//! Data access seams for the attendance service.
//!
//! The service never reaches for a global connection: it is handed these
//! traits, backed by MySQL in production and by memory in tests.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AttendanceResult;
use crate::model::attendance::{AttendanceRecord, BreakPeriod};
use crate::model::employee::EmployeeProfile;
use crate::model::policy::{GeoFence, ShiftWindow};

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AttendanceResult<Option<AttendanceRecord>>;

    async fn find_by_id(&self, id: u64) -> AttendanceResult<Option<AttendanceRecord>>;

    /// Stores a new record and returns it with its assigned id.
    ///
    /// At most one record exists per employee and date; a second insert
    /// fails with `Conflict` and leaves the first untouched.
    async fn insert(&self, record: AttendanceRecord) -> AttendanceResult<AttendanceRecord>;

    /// Overwrites a record that has not been checked out yet.
    ///
    /// Fails with `Conflict` when the stored record is already checked out,
    /// which is how a concurrent second check-out is detected.
    async fn update_open(&self, record: &AttendanceRecord) -> AttendanceResult<()>;

    /// Records of one employee in `[start, end]`, date ascending, at most `limit`.
    async fn list_for_employee(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> AttendanceResult<Vec<AttendanceRecord>>;

    /// Records of every employee in `[start, end]`, at most `limit`.
    async fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> AttendanceResult<Vec<AttendanceRecord>>;

    async fn breaks_for(&self, attendance_id: u64) -> AttendanceResult<Vec<BreakPeriod>>;

    /// Breaks still running on records dated `date`.
    async fn open_breaks_on(&self, date: NaiveDate) -> AttendanceResult<Vec<BreakPeriod>>;

    async fn insert_break(&self, period: BreakPeriod) -> AttendanceResult<BreakPeriod>;

    async fn update_break(&self, period: &BreakPeriod) -> AttendanceResult<()>;
}

/// Read-only employee, department and branch configuration.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_employee(&self, employee_id: u64) -> AttendanceResult<Option<EmployeeProfile>>;

    async fn list_active_employees(&self) -> AttendanceResult<Vec<EmployeeProfile>>;

    async fn department_shift(&self, department_id: u64) -> AttendanceResult<Option<ShiftWindow>>;

    /// `None` when the branch has no location configured.
    async fn branch_geofence(&self, branch_id: u64) -> AttendanceResult<Option<GeoFence>>;
}
