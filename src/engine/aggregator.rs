use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::report::{Anomaly, AnomalyKind};

/// How days without any attendance record enter the percentage.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissingDayPolicy {
    /// Only days with a record form the denominator.
    #[default]
    Exclude,
    /// Every calendar day of the range forms the denominator.
    CountAsAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttendanceTally {
    pub counted_days: u32,
    pub present_days: u32,
}

impl AttendanceTally {
    /// `None` when no day could be counted.
    pub fn percentage(&self) -> Option<f64> {
        (self.counted_days > 0)
            .then(|| self.present_days as f64 * 100.0 / self.counted_days as f64)
    }
}

/// Counts present days against the days of `[start, end]` that qualify under `policy`.
pub fn tally_attendance(
    records: &[AttendanceRecord],
    start: NaiveDate,
    end: NaiveDate,
    policy: MissingDayPolicy,
) -> AttendanceTally {
    // one entry per day; a day is present if any of its records is
    let mut days: BTreeMap<NaiveDate, bool> = BTreeMap::new();
    for record in records.iter().filter(|r| r.date >= start && r.date <= end) {
        let present = record.is_present && !record.is_absent;
        *days.entry(record.date).or_insert(false) |= present;
    }

    let present_days = days.values().filter(|p| **p).count() as u32;
    let counted_days = match policy {
        MissingDayPolicy::Exclude => days.len() as u32,
        MissingDayPolicy::CountAsAbsent if end >= start => ((end - start).num_days() + 1) as u32,
        MissingDayPolicy::CountAsAbsent => 0,
    };

    AttendanceTally {
        counted_days,
        present_days,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyThresholds {
    pub absence_run: u32,
    pub late_run: u32,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            absence_run: 3,
            late_run: 3,
        }
    }
}

#[derive(Default)]
struct Run {
    start: Option<NaiveDate>,
    len: u32,
}

impl Run {
    fn extend(&mut self, date: NaiveDate) {
        self.start.get_or_insert(date);
        self.len += 1;
    }

    fn close(&mut self, kind: AnomalyKind, threshold: u32, out: &mut Vec<Anomaly>) {
        if let Some(start_date) = self.start.take() {
            if self.len >= threshold.max(1) {
                out.push(Anomaly {
                    kind,
                    start_date,
                    run_length: self.len,
                });
            }
        }
        self.len = 0;
    }
}

/// Single pass over the records in date order, flagging runs of absences
/// and of late arrivals that reach their threshold. Days without a record
/// neither extend nor break a run.
pub fn detect_anomalies(records: &[AttendanceRecord], thresholds: AnomalyThresholds) -> Vec<Anomaly> {
    let mut sorted: Vec<&AttendanceRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.date);

    let mut anomalies = Vec::new();
    let mut absent = Run::default();
    let mut late = Run::default();

    for record in sorted {
        if record.is_absent {
            absent.extend(record.date);
        } else {
            absent.close(AnomalyKind::ConsecutiveAbsence, thresholds.absence_run, &mut anomalies);
        }

        if record.is_late && !record.is_absent {
            late.extend(record.date);
        } else {
            late.close(AnomalyKind::ConsecutiveLateArrival, thresholds.late_run, &mut anomalies);
        }
    }
    absent.close(AnomalyKind::ConsecutiveAbsence, thresholds.absence_run, &mut anomalies);
    late.close(AnomalyKind::ConsecutiveLateArrival, thresholds.late_run, &mut anomalies);

    anomalies.sort_by_key(|a| a.start_date);
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn record(offset: i64, present: bool) -> AttendanceRecord {
        let mut r = AttendanceRecord::new(1, first() + Duration::days(offset));
        r.is_present = present;
        r.is_absent = !present;
        r
    }

    fn late(offset: i64) -> AttendanceRecord {
        let mut r = record(offset, true);
        r.is_late = true;
        r
    }

    #[test]
    fn alternating_month_lands_between_forty_and_sixty_percent() {
        let records: Vec<_> = (0..20).map(|i| record(i, i % 2 == 0)).collect();
        let end = first() + Duration::days(30);
        let tally = tally_attendance(&records, first(), end, MissingDayPolicy::Exclude);
        let pct = tally.percentage().unwrap();
        assert!(pct > 40.0 && pct < 60.0, "got {pct}");
        assert_eq!(tally.counted_days, 20);
        assert_eq!(tally.present_days, 10);
    }

    #[test]
    fn missing_days_can_count_as_absent() {
        let records: Vec<_> = (0..10).map(|i| record(i, true)).collect();
        let end = first() + Duration::days(19);
        let tally = tally_attendance(&records, first(), end, MissingDayPolicy::CountAsAbsent);
        assert_eq!(tally.counted_days, 20);
        assert_eq!(tally.percentage(), Some(50.0));
    }

    #[test]
    fn empty_range_has_no_percentage() {
        let tally = tally_attendance(&[], first(), first(), MissingDayPolicy::Exclude);
        assert_eq!(tally.percentage(), None);
    }

    #[test]
    fn records_outside_the_range_are_ignored() {
        let records = vec![record(0, true), record(40, false)];
        let tally = tally_attendance(&records, first(), first() + Duration::days(5), MissingDayPolicy::Exclude);
        assert_eq!(tally.counted_days, 1);
        assert_eq!(tally.percentage(), Some(100.0));
    }

    #[test]
    fn three_absences_in_a_row_are_flagged() {
        let records = vec![
            record(0, true),
            record(1, false),
            record(2, false),
            record(3, false),
            record(4, true),
            record(5, false),
            record(6, false),
        ];
        let anomalies = detect_anomalies(&records, AnomalyThresholds::default());
        assert_eq!(
            anomalies,
            vec![Anomaly {
                kind: AnomalyKind::ConsecutiveAbsence,
                start_date: first() + Duration::days(1),
                run_length: 3,
            }]
        );
    }

    #[test]
    fn trailing_run_is_reported_and_input_order_does_not_matter() {
        let mut records: Vec<_> = (0..5).map(|i| record(i, false)).collect();
        records.reverse();
        let anomalies = detect_anomalies(&records, AnomalyThresholds::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].start_date, first());
        assert_eq!(anomalies[0].run_length, 5);
    }

    #[test]
    fn gaps_without_records_do_not_break_a_run() {
        // Friday, then Monday and Tuesday
        let records = vec![record(0, false), record(3, false), record(4, false)];
        let anomalies = detect_anomalies(&records, AnomalyThresholds::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].run_length, 3);
    }

    #[test]
    fn repeated_lateness_is_its_own_kind() {
        let records = vec![late(0), late(1), late(2), late(3), record(4, true)];
        let thresholds = AnomalyThresholds {
            absence_run: 3,
            late_run: 4,
        };
        let anomalies = detect_anomalies(&records, thresholds);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::ConsecutiveLateArrival);
        assert_eq!(anomalies[0].run_length, 4);
    }

    #[test]
    fn short_runs_are_not_anomalies() {
        let records = vec![record(0, false), record(1, false), record(2, true)];
        assert!(detect_anomalies(&records, AnomalyThresholds::default()).is_empty());
    }
}
