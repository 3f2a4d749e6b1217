use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

use crate::engine::aggregator::{AnomalyThresholds, MissingDayPolicy};
use crate::engine::performance::ScoreWeights;

/// Business rules threaded explicitly into every engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePolicy {
    /// Baseline for overtime.
    pub expected_work_hours: f64,
    /// Reject check-in/out outside the branch geofence instead of just recording it.
    pub enforce_geofence: bool,
    pub anomaly_thresholds: AnomalyThresholds,
    pub max_lookback_days: i64,
    /// Upper bound on rows fetched by one aggregation query.
    pub max_report_rows: usize,
    pub missing_day_policy: MissingDayPolicy,
    pub score_weights: ScoreWeights,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            expected_work_hours: 8.0,
            enforce_geofence: true,
            anomaly_thresholds: AnomalyThresholds::default(),
            max_lookback_days: 365,
            max_report_rows: 50_000,
            missing_day_policy: MissingDayPolicy::default(),
            score_weights: ScoreWeights::default(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub policy_cache_ttl_secs: u64,
    pub policy: AttendancePolicy,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

impl AttendancePolicy {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let policy = Self {
            expected_work_hours: or_default("EXPECTED_WORK_HOURS", defaults.expected_work_hours)?,
            enforce_geofence: or_default("ENFORCE_GEOFENCE", defaults.enforce_geofence)?,
            anomaly_thresholds: AnomalyThresholds {
                absence_run: or_default(
                    "ABSENCE_RUN_THRESHOLD",
                    defaults.anomaly_thresholds.absence_run,
                )?,
                late_run: or_default("LATE_RUN_THRESHOLD", defaults.anomaly_thresholds.late_run)?,
            },
            max_lookback_days: or_default("MAX_LOOKBACK_DAYS", defaults.max_lookback_days)?,
            max_report_rows: or_default("MAX_REPORT_ROWS", defaults.max_report_rows)?,
            missing_day_policy: or_default("MISSING_DAY_POLICY", defaults.missing_day_policy)?,
            score_weights: ScoreWeights {
                late_penalty: or_default("LATE_PENALTY", defaults.score_weights.late_penalty)?,
                early_departure_penalty: or_default(
                    "EARLY_DEPARTURE_PENALTY",
                    defaults.score_weights.early_departure_penalty,
                )?,
            },
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.expected_work_hours.is_finite() || self.expected_work_hours < 0.0 {
            bail!("EXPECTED_WORK_HOURS must be a non-negative number");
        }
        if self.anomaly_thresholds.absence_run == 0 || self.anomaly_thresholds.late_run == 0 {
            bail!("anomaly run thresholds must be at least 1");
        }
        if self.max_lookback_days < 1 {
            bail!("MAX_LOOKBACK_DAYS must be at least 1");
        }
        if self.max_report_rows == 0 {
            bail!("MAX_REPORT_ROWS must be at least 1");
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            policy_cache_ttl_secs: or_default("POLICY_CACHE_TTL_SECS", 300)?, // default 5 min
            policy: AttendancePolicy::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        AttendancePolicy::default().validate().unwrap();
    }

    #[test]
    fn zero_thresholds_are_rejected() {
        let mut policy = AttendancePolicy::default();
        policy.anomaly_thresholds.absence_run = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn missing_day_policy_parses_from_env_style_strings() {
        assert_eq!(
            "count_as_absent".parse::<MissingDayPolicy>().unwrap(),
            MissingDayPolicy::CountAsAbsent
        );
        assert_eq!(
            "exclude".parse::<MissingDayPolicy>().unwrap(),
            MissingDayPolicy::Exclude
        );
    }
}
