use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceRepository, DirectoryRepository};
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::{AttendanceRecord, BreakPeriod};
use crate::model::employee::EmployeeProfile;
use crate::model::policy::{GeoFence, ShiftWindow};

#[derive(Default)]
struct Tables {
    records: BTreeMap<u64, AttendanceRecord>,
    breaks: BTreeMap<u64, BreakPeriod>,
    next_record_id: u64,
    next_break_id: u64,
}

/// Attendance storage held in process memory, with the same uniqueness
/// rules as the MySQL schema.
#[derive(Default)]
pub struct InMemoryAttendanceRepository {
    tables: Mutex<Tables>,
}

impl InMemoryAttendanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("attendance tables poisoned")
    }

    pub fn record_count(&self) -> usize {
        self.tables().records.len()
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryAttendanceRepository {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AttendanceResult<Option<AttendanceRecord>> {
        Ok(self
            .tables()
            .records
            .values()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> AttendanceResult<Option<AttendanceRecord>> {
        Ok(self.tables().records.get(&id).cloned())
    }

    async fn insert(&self, mut record: AttendanceRecord) -> AttendanceResult<AttendanceRecord> {
        let mut tables = self.tables();
        let duplicate = tables
            .records
            .values()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date);
        if duplicate {
            return Err(AttendanceError::conflict(format!(
                "Attendance for employee {} on {} already exists",
                record.employee_id, record.date
            )));
        }

        tables.next_record_id += 1;
        record.id = tables.next_record_id;
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_open(&self, record: &AttendanceRecord) -> AttendanceResult<()> {
        let mut tables = self.tables();
        match tables.records.get_mut(&record.id) {
            Some(stored) if stored.check_out.is_none() => {
                *stored = record.clone();
                Ok(())
            }
            Some(_) => Err(AttendanceError::conflict(format!(
                "Attendance {} is already checked out",
                record.id
            ))),
            None => Err(AttendanceError::not_found(format!(
                "Attendance {} not found",
                record.id
            ))),
        }
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let mut rows: Vec<_> = self
            .tables()
            .records
            .values()
            .filter(|r| r.employee_id == employee_id && r.date >= start && r.date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let mut rows: Vec<_> = self
            .tables()
            .records
            .values()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.date, r.employee_id));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn breaks_for(&self, attendance_id: u64) -> AttendanceResult<Vec<BreakPeriod>> {
        Ok(self
            .tables()
            .breaks
            .values()
            .filter(|b| b.attendance_id == attendance_id)
            .cloned()
            .collect())
    }

    async fn open_breaks_on(&self, date: NaiveDate) -> AttendanceResult<Vec<BreakPeriod>> {
        let tables = self.tables();
        Ok(tables
            .breaks
            .values()
            .filter(|b| b.is_open())
            .filter(|b| {
                tables
                    .records
                    .get(&b.attendance_id)
                    .is_some_and(|r| r.date == date)
            })
            .cloned()
            .collect())
    }

    async fn insert_break(&self, mut period: BreakPeriod) -> AttendanceResult<BreakPeriod> {
        let mut tables = self.tables();
        if !tables.records.contains_key(&period.attendance_id) {
            return Err(AttendanceError::not_found(format!(
                "Attendance {} not found",
                period.attendance_id
            )));
        }
        tables.next_break_id += 1;
        period.id = tables.next_break_id;
        tables.breaks.insert(period.id, period.clone());
        Ok(period)
    }

    async fn update_break(&self, period: &BreakPeriod) -> AttendanceResult<()> {
        let mut tables = self.tables();
        match tables.breaks.get_mut(&period.id) {
            Some(stored) => {
                *stored = period.clone();
                Ok(())
            }
            None => Err(AttendanceError::not_found(format!(
                "Break {} not found",
                period.id
            ))),
        }
    }
}

/// Fixed directory contents, assembled with the `with_*` builders.
#[derive(Default)]
pub struct InMemoryDirectory {
    employees: Vec<EmployeeProfile>,
    shifts: HashMap<u64, ShiftWindow>,
    geofences: HashMap<u64, GeoFence>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employee(mut self, employee: EmployeeProfile) -> Self {
        self.employees.push(employee);
        self
    }

    pub fn with_shift(mut self, department_id: u64, shift: ShiftWindow) -> Self {
        self.shifts.insert(department_id, shift);
        self
    }

    pub fn with_geofence(mut self, branch_id: u64, fence: GeoFence) -> Self {
        self.geofences.insert(branch_id, fence);
        self
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryDirectory {
    async fn find_employee(&self, employee_id: u64) -> AttendanceResult<Option<EmployeeProfile>> {
        Ok(self.employees.iter().find(|e| e.id == employee_id).cloned())
    }

    async fn list_active_employees(&self) -> AttendanceResult<Vec<EmployeeProfile>> {
        Ok(self
            .employees
            .iter()
            .filter(|e| e.is_active)
            .cloned()
            .collect())
    }

    async fn department_shift(&self, department_id: u64) -> AttendanceResult<Option<ShiftWindow>> {
        Ok(self.shifts.get(&department_id).cloned())
    }

    async fn branch_geofence(&self, branch_id: u64) -> AttendanceResult<Option<GeoFence>> {
        Ok(self.geofences.get(&branch_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    #[actix_web::test]
    async fn second_insert_for_the_same_day_conflicts() {
        let repo = InMemoryAttendanceRepository::new();
        let first = repo.insert(AttendanceRecord::new(1, day(1))).await.unwrap();
        assert_eq!(first.id, 1);

        let err = repo.insert(AttendanceRecord::new(1, day(1))).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));
        assert_eq!(repo.record_count(), 1);

        repo.insert(AttendanceRecord::new(2, day(1))).await.unwrap();
        repo.insert(AttendanceRecord::new(1, day(2))).await.unwrap();
        assert_eq!(repo.record_count(), 3);
    }

    #[actix_web::test]
    async fn checked_out_records_reject_updates() {
        let repo = InMemoryAttendanceRepository::new();
        let mut record = repo.insert(AttendanceRecord::new(1, day(1))).await.unwrap();
        record.check_out = day(1).and_hms_opt(17, 0, 0);
        repo.update_open(&record).await.unwrap();

        let err = repo.update_open(&record).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Conflict(_)));
    }

    #[actix_web::test]
    async fn range_queries_are_sorted_and_bounded() {
        let repo = InMemoryAttendanceRepository::new();
        for d in [5, 1, 3, 2, 4] {
            repo.insert(AttendanceRecord::new(9, day(d))).await.unwrap();
        }
        let rows = repo.list_for_employee(9, day(2), day(5), 3).await.unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(2), day(3), day(4)]);
    }
}
