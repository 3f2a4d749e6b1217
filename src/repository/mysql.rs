use std::str::FromStr;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::StreamExt;
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, info};

use super::{AttendanceRepository, DirectoryRepository};
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::{AttendanceRecord, BreakPeriod, BreakType};
use crate::model::employee::EmployeeProfile;
use crate::model::policy::{GeoFence, ShiftWindow};
use crate::utils::db_utils::map_insert_error;
use crate::utils::policy_cache::PolicyCache;

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, date, check_in, check_out,
    check_in_latitude, check_in_longitude, check_in_within_geofence,
    check_out_latitude, check_out_longitude, check_out_within_geofence,
    total_break_minutes, total_work_hours, overtime_hours,
    late_minutes, early_departure_minutes,
    is_late, is_early_departure, is_absent, is_present
"#;

#[derive(FromRow)]
struct BreakRow {
    id: u64,
    attendance_id: u64,
    break_type: String,
    started_at: NaiveDateTime,
    ended_at: Option<NaiveDateTime>,
}

impl TryFrom<BreakRow> for BreakPeriod {
    type Error = AttendanceError;

    fn try_from(row: BreakRow) -> Result<Self, Self::Error> {
        let break_type = BreakType::from_str(&row.break_type)
            .map_err(|e| AttendanceError::Storage(sqlx::Error::Decode(Box::new(e))))?;
        Ok(BreakPeriod {
            id: row.id,
            attendance_id: row.attendance_id,
            break_type,
            started_at: row.started_at,
            ended_at: row.ended_at,
        })
    }
}

fn into_breaks(rows: Vec<BreakRow>) -> AttendanceResult<Vec<BreakPeriod>> {
    rows.into_iter().map(BreakPeriod::try_from).collect()
}

pub struct MySqlAttendanceRepository {
    pool: MySqlPool,
}

impl MySqlAttendanceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for MySqlAttendanceRepository {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> AttendanceResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: u64) -> AttendanceResult<Option<AttendanceRecord>> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn insert(&self, mut record: AttendanceRecord) -> AttendanceResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, date, check_in, check_out,
                 check_in_latitude, check_in_longitude, check_in_within_geofence,
                 check_out_latitude, check_out_longitude, check_out_within_geofence,
                 total_break_minutes, total_work_hours, overtime_hours,
                 late_minutes, early_departure_minutes,
                 is_late, is_early_departure, is_absent, is_present)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(record.date)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.check_in_latitude)
        .bind(record.check_in_longitude)
        .bind(record.check_in_within_geofence)
        .bind(record.check_out_latitude)
        .bind(record.check_out_longitude)
        .bind(record.check_out_within_geofence)
        .bind(record.total_break_minutes)
        .bind(record.total_work_hours)
        .bind(record.overtime_hours)
        .bind(record.late_minutes)
        .bind(record.early_departure_minutes)
        .bind(record.is_late)
        .bind(record.is_early_departure)
        .bind(record.is_absent)
        .bind(record.is_present)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                format!(
                    "Attendance for employee {} on {} already exists",
                    record.employee_id, record.date
                ),
            )
        })?;

        record.id = result.last_insert_id();
        Ok(record)
    }

    async fn update_open(&self, record: &AttendanceRecord) -> AttendanceResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?,
                check_out_latitude = ?,
                check_out_longitude = ?,
                check_out_within_geofence = ?,
                total_break_minutes = ?,
                total_work_hours = ?,
                overtime_hours = ?,
                early_departure_minutes = ?,
                is_early_departure = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(record.check_out)
        .bind(record.check_out_latitude)
        .bind(record.check_out_longitude)
        .bind(record.check_out_within_geofence)
        .bind(record.total_break_minutes)
        .bind(record.total_work_hours)
        .bind(record.overtime_hours)
        .bind(record.early_departure_minutes)
        .bind(record.is_early_departure)
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AttendanceError::conflict(format!(
                "Attendance {} is already checked out",
                record.id
            )));
        }
        Ok(())
    }

    async fn list_for_employee(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE employee_id = ? AND date BETWEEN ? AND ? \
             ORDER BY date ASC LIMIT ?"
        );
        debug!(employee_id, %start, %end, limit, "Fetching attendance for employee");

        let rows = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(start)
            .bind(end)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        limit: usize,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE date BETWEEN ? AND ? \
             ORDER BY date ASC, employee_id ASC LIMIT ?"
        );
        debug!(%start, %end, limit, "Fetching attendance range");

        let rows = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(start)
            .bind(end)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn breaks_for(&self, attendance_id: u64) -> AttendanceResult<Vec<BreakPeriod>> {
        let rows = sqlx::query_as::<_, BreakRow>(
            r#"
            SELECT id, attendance_id, break_type, started_at, ended_at
            FROM attendance_breaks
            WHERE attendance_id = ?
            ORDER BY started_at ASC
            "#,
        )
        .bind(attendance_id)
        .fetch_all(&self.pool)
        .await?;
        into_breaks(rows)
    }

    async fn open_breaks_on(&self, date: NaiveDate) -> AttendanceResult<Vec<BreakPeriod>> {
        let rows = sqlx::query_as::<_, BreakRow>(
            r#"
            SELECT b.id, b.attendance_id, b.break_type, b.started_at, b.ended_at
            FROM attendance_breaks b
            JOIN attendance a ON a.id = b.attendance_id
            WHERE a.date = ?
            AND b.ended_at IS NULL
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        into_breaks(rows)
    }

    async fn insert_break(&self, mut period: BreakPeriod) -> AttendanceResult<BreakPeriod> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_breaks (attendance_id, break_type, started_at, ended_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(period.attendance_id)
        .bind(period.break_type.to_string())
        .bind(period.started_at)
        .bind(period.ended_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                format!("A break is already open for attendance {}", period.attendance_id),
            )
        })?;

        period.id = result.last_insert_id();
        Ok(period)
    }

    async fn update_break(&self, period: &BreakPeriod) -> AttendanceResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_breaks
            SET ended_at = ?
            WHERE id = ?
            AND ended_at IS NULL
            "#,
        )
        .bind(period.ended_at)
        .bind(period.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AttendanceError::conflict(format!(
                "Break {} is already closed",
                period.id
            )));
        }
        Ok(())
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    full_name: String,
    department_id: u64,
    department_name: String,
    branch_id: u64,
    branch_name: String,
    status: String,
}

impl From<EmployeeRow> for EmployeeProfile {
    fn from(row: EmployeeRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            department_id: row.department_id,
            department_name: row.department_name,
            branch_id: row.branch_id,
            branch_name: row.branch_name,
            is_active: row.status == "active",
        }
    }
}

const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.id,
        CONCAT(e.first_name, ' ', e.last_name) AS full_name,
        e.department_id,
        d.name AS department_name,
        e.branch_id,
        b.name AS branch_name,
        e.status
    FROM employees e
    JOIN departments d ON d.id = e.department_id
    JOIN branches b ON b.id = e.branch_id
"#;

const SHIFT_SELECT: &str = r#"
    SELECT
        start_time AS `start`,
        end_time AS `end`,
        late_grace_minutes,
        early_departure_grace_minutes
    FROM department_shifts
    WHERE department_id = ?
"#;

const GEOFENCE_SELECT: &str = r#"
    SELECT
        latitude,
        longitude,
        geofence_radius_meters AS radius_meters
    FROM branches
    WHERE id = ?
    AND latitude IS NOT NULL
    AND longitude IS NOT NULL
    AND geofence_radius_meters IS NOT NULL
"#;

/// Employee directory backed by MySQL, with shifts and geofences cached.
pub struct MySqlDirectory {
    pool: MySqlPool,
    cache: PolicyCache,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool, cache: PolicyCache) -> Self {
        Self { pool, cache }
    }

    /// Preload every department shift into the cache, streaming in batches.
    pub async fn warm_up(&self, batch_size: usize) -> anyhow::Result<()> {
        let mut stream = sqlx::query_as::<_, (u64, NaiveTime, NaiveTime, i64, i64)>(
            r#"
            SELECT department_id, start_time, end_time, late_grace_minutes, early_departure_grace_minutes
            FROM department_shifts
            "#,
        )
        .fetch(&self.pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (department_id, start, end, late_grace_minutes, early_departure_grace_minutes) =
                row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

            batch.push((
                department_id,
                ShiftWindow {
                    start,
                    end,
                    late_grace_minutes,
                    early_departure_grace_minutes,
                },
            ));
            total += 1;

            if batch.len() >= batch_size {
                self.cache.remember_shifts(&batch).await;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.cache.remember_shifts(&batch).await;
        }

        info!(total, "Policy cache warmup complete");
        Ok(())
    }
}

#[async_trait]
impl DirectoryRepository for MySqlDirectory {
    async fn find_employee(&self, employee_id: u64) -> AttendanceResult<Option<EmployeeProfile>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EmployeeProfile::from))
    }

    async fn list_active_employees(&self) -> AttendanceResult<Vec<EmployeeProfile>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.status = 'active' ORDER BY e.id");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(EmployeeProfile::from).collect())
    }

    async fn department_shift(&self, department_id: u64) -> AttendanceResult<Option<ShiftWindow>> {
        if let Some(shift) = self.cache.shift(department_id).await {
            return Ok(Some(shift));
        }

        let shift = sqlx::query_as::<_, ShiftWindow>(SHIFT_SELECT)
            .bind(department_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(shift) = &shift {
            self.cache.remember_shift(department_id, shift.clone()).await;
        }
        Ok(shift)
    }

    async fn branch_geofence(&self, branch_id: u64) -> AttendanceResult<Option<GeoFence>> {
        if let Some(fence) = self.cache.geofence(branch_id).await {
            return Ok(Some(fence));
        }

        let fence = sqlx::query_as::<_, GeoFence>(GEOFENCE_SELECT)
            .bind(branch_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(fence) = &fence {
            self.cache.remember_geofence(branch_id, fence.clone()).await;
        }
        Ok(fence)
    }
}
