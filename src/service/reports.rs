use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use futures::future::try_join_all;
use tracing::debug;

use super::attendance::AttendanceService;
use crate::engine::aggregator::{detect_anomalies, tally_attendance};
use crate::engine::performance::{ScoreWeights, average_score, calculate_performance_score};
use crate::error::{AttendanceError, AttendanceResult};
use crate::model::attendance::{AttendanceDay, AttendanceRecord, BreakPeriod};
use crate::model::employee::EmployeeProfile;
use crate::model::report::{
    AnomalyReport, AttendanceOverview, AttendancePercentage, BranchAttendance, DashboardStats,
    DepartmentPerformance, OverviewSummary, PerformanceScoreView,
};

fn check_range(start: NaiveDate, end: NaiveDate) -> AttendanceResult<()> {
    if start > end {
        return Err(AttendanceError::validation(format!(
            "start_date {start} cannot be after end_date {end}"
        )));
    }
    Ok(())
}

fn rate(present: u32, counted: u32) -> f64 {
    if counted == 0 {
        0.0
    } else {
        present as f64 * 100.0 / counted as f64
    }
}

/// Fetches are asked for one row past the cap, so a full page means the
/// range holds more than the cap and the report would be partial.
fn within_cap(rows: Vec<AttendanceRecord>, cap: usize) -> AttendanceResult<Vec<AttendanceRecord>> {
    if rows.len() > cap {
        return Err(AttendanceError::validation(format!(
            "Range holds more than {cap} attendance records, narrow the dates"
        )));
    }
    Ok(rows)
}

impl AttendanceService {
    async fn employee_records(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let cap = self.policy.max_report_rows;
        let rows = self
            .records
            .list_for_employee(employee_id, start, end, cap.saturating_add(1))
            .await?;
        within_cap(rows, cap)
    }

    async fn records_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<Vec<AttendanceRecord>> {
        let cap = self.policy.max_report_rows;
        let rows = self
            .records
            .list_in_range(start, end, cap.saturating_add(1))
            .await?;
        within_cap(rows, cap)
    }

    /// Records in `[start, end]` with their breaks, date ascending.
    pub async fn history(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<Vec<AttendanceDay>> {
        check_range(start, end)?;
        self.directory
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Employee {employee_id} not found")))?;

        let records = self
            .employee_records(employee_id, start, end)
            .await?;
        let breaks = try_join_all(records.iter().map(|r| self.records.breaks_for(r.id))).await?;

        Ok(records
            .into_iter()
            .zip(breaks)
            .map(|(attendance, breaks)| AttendanceDay { attendance, breaks })
            .collect())
    }

    pub async fn calculate_attendance_percentage(
        &self,
        employee_id: u64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AttendanceResult<AttendancePercentage> {
        check_range(start, end)?;
        self.directory
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Employee {employee_id} not found")))?;

        let records = self
            .employee_records(employee_id, start, end)
            .await?;
        let tally = tally_attendance(&records, start, end, self.policy.missing_day_policy);
        debug!(employee_id, counted = tally.counted_days, present = tally.present_days, "Attendance tallied");

        Ok(AttendancePercentage {
            employee_id,
            start_date: start,
            end_date: end,
            recorded_days: tally.counted_days,
            present_days: tally.present_days,
            percentage: tally.percentage().unwrap_or(0.0),
            missing_day_policy: self.policy.missing_day_policy,
            empty: records.is_empty(),
        })
    }

    /// Scans the `lookback_days` ending at `today` (inclusive) for anomaly runs.
    pub async fn detect_anomalies(
        &self,
        employee_id: u64,
        lookback_days: i64,
        today: NaiveDate,
    ) -> AttendanceResult<AnomalyReport> {
        if lookback_days < 1 {
            return Err(AttendanceError::validation("lookback_days must be at least 1"));
        }
        if lookback_days > self.policy.max_lookback_days {
            return Err(AttendanceError::validation(format!(
                "lookback_days cannot exceed {}",
                self.policy.max_lookback_days
            )));
        }
        self.directory
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Employee {employee_id} not found")))?;

        let window_start = today - Duration::days(lookback_days - 1);
        let records = self
            .employee_records(employee_id, window_start, today)
            .await?;
        let anomalies = detect_anomalies(&records, self.policy.anomaly_thresholds);

        Ok(AnomalyReport {
            employee_id,
            window_start,
            window_end: today,
            records_scanned: records.len() as u32,
            anomalies,
            empty: records.is_empty(),
        })
    }

    pub async fn performance_score(&self, attendance_id: u64) -> AttendanceResult<PerformanceScoreView> {
        let record = self
            .records
            .find_by_id(attendance_id)
            .await?
            .ok_or_else(|| {
                AttendanceError::not_found(format!("Attendance {attendance_id} not found"))
            })?;

        Ok(PerformanceScoreView {
            attendance_id: record.id,
            employee_id: record.employee_id,
            date: record.date,
            score: calculate_performance_score(&record, self.policy.score_weights),
            is_late: record.is_late,
            is_early_departure: record.is_early_departure,
            overtime_hours: record.overtime_hours,
        })
    }

    pub async fn dashboard(&self, date: NaiveDate) -> AttendanceResult<DashboardStats> {
        let (employees, records, open_breaks) = futures::try_join!(
            self.directory.list_active_employees(),
            self.records_in_range(date, date),
            self.records.open_breaks_on(date),
        )?;
        Ok(build_dashboard(date, &employees, &records, &open_breaks))
    }

    pub async fn overview(&self, start: NaiveDate, end: NaiveDate) -> AttendanceResult<AttendanceOverview> {
        check_range(start, end)?;
        if (end - start).num_days() + 1 > self.policy.max_lookback_days {
            return Err(AttendanceError::validation(format!(
                "Overview range cannot exceed {} days",
                self.policy.max_lookback_days
            )));
        }

        let (employees, records) = futures::try_join!(
            self.directory.list_active_employees(),
            self.records_in_range(start, end),
        )?;
        Ok(build_overview(start, end, &employees, &records, self.policy.score_weights))
    }
}

/// Today's counts over active employees only.
pub fn build_dashboard(
    date: NaiveDate,
    employees: &[EmployeeProfile],
    records: &[AttendanceRecord],
    open_breaks: &[BreakPeriod],
) -> DashboardStats {
    let active: HashSet<u64> = employees.iter().map(|e| e.id).collect();
    let todays: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| r.date == date && active.contains(&r.employee_id))
        .collect();

    let present_today = todays.iter().filter(|r| r.is_present && !r.is_absent).count() as u32;
    let on_break: HashSet<u64> = open_breaks.iter().map(|b| b.attendance_id).collect();
    let total_employees = active.len() as u32;

    DashboardStats {
        date,
        total_employees,
        present_today,
        absent_today: total_employees.saturating_sub(present_today),
        late_today: todays.iter().filter(|r| r.is_late).count() as u32,
        on_break_now: todays.iter().filter(|r| on_break.contains(&r.id)).count() as u32,
        checked_out_today: todays.iter().filter(|r| r.check_out.is_some()).count() as u32,
    }
}

/// Summary, ranked branch attendance and per-department scores for a range.
pub fn build_overview(
    start: NaiveDate,
    end: NaiveDate,
    employees: &[EmployeeProfile],
    records: &[AttendanceRecord],
    weights: ScoreWeights,
) -> AttendanceOverview {
    let by_id: HashMap<u64, &EmployeeProfile> = employees.iter().map(|e| (e.id, e)).collect();
    let relevant: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| r.date >= start && r.date <= end && by_id.contains_key(&r.employee_id))
        .collect();

    let is_present = |r: &AttendanceRecord| r.is_present && !r.is_absent;

    let present_days = relevant.iter().filter(|r| is_present(r)).count() as u32;
    let summary = OverviewSummary {
        start_date: start,
        end_date: end,
        total_employees: employees.len() as u32,
        total_records: relevant.len() as u32,
        present_days,
        absent_days: relevant.iter().filter(|r| r.is_absent).count() as u32,
        late_days: relevant.iter().filter(|r| r.is_late).count() as u32,
        attendance_rate: rate(present_days, relevant.len() as u32),
        average_score: average_score(&relevant, weights).unwrap_or(0.0),
        empty: relevant.is_empty(),
    };

    // branch_id -> (name, employees, recorded, present)
    let mut branches: BTreeMap<u64, (String, u32, u32, u32)> = BTreeMap::new();
    for e in employees {
        branches.entry(e.branch_id).or_insert_with(|| (e.branch_name.clone(), 0, 0, 0)).1 += 1;
    }
    for r in &relevant {
        let branch_id = by_id[&r.employee_id].branch_id;
        if let Some(entry) = branches.get_mut(&branch_id) {
            entry.2 += 1;
            if is_present(r) {
                entry.3 += 1;
            }
        }
    }

    let mut attendance_by_branch: Vec<BranchAttendance> = branches
        .into_iter()
        .map(|(branch_id, (branch_name, employees, recorded_days, present_days))| BranchAttendance {
            rank: 0,
            branch_id,
            branch_name,
            employees,
            recorded_days,
            present_days,
            attendance_rate: rate(present_days, recorded_days),
        })
        .collect();
    attendance_by_branch.sort_by(|a, b| {
        b.attendance_rate
            .total_cmp(&a.attendance_rate)
            .then(a.branch_id.cmp(&b.branch_id))
    });
    for (i, branch) in attendance_by_branch.iter_mut().enumerate() {
        branch.rank = i as u32 + 1;
    }

    let mut departments: BTreeMap<u64, (String, Vec<&AttendanceRecord>)> = BTreeMap::new();
    for e in employees {
        departments
            .entry(e.department_id)
            .or_insert_with(|| (e.department_name.clone(), Vec::new()));
    }
    for r in &relevant {
        let department_id = by_id[&r.employee_id].department_id;
        if let Some(entry) = departments.get_mut(&department_id) {
            entry.1.push(*r);
        }
    }

    let department_performance = departments
        .into_iter()
        .map(|(department_id, (department_name, rows))| DepartmentPerformance {
            department_id,
            department_name,
            records: rows.len() as u32,
            average_score: average_score(&rows, weights).unwrap_or(0.0),
            late_count: rows.iter().filter(|r| r.is_late).count() as u32,
            early_departure_count: rows.iter().filter(|r| r.is_early_departure).count() as u32,
            overtime_hours: rows.iter().map(|r| r.overtime_hours).sum(),
        })
        .collect();

    AttendanceOverview {
        summary,
        attendance_by_branch,
        department_performance,
    }
}
