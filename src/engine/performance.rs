use serde::{Deserialize, Serialize};

use crate::model::attendance::AttendanceRecord;

pub const MAX_SCORE: u8 = 100;

/// Penalties subtracted from a perfect score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub late_penalty: u8,
    pub early_departure_penalty: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            late_penalty: 20,
            early_departure_penalty: 15,
        }
    }
}

/// 0–100 score for one day. Overtime is neutral; absence scores 0.
pub fn calculate_performance_score(record: &AttendanceRecord, weights: ScoreWeights) -> u8 {
    if record.is_absent {
        return 0;
    }

    let mut score = MAX_SCORE;
    if record.is_late {
        score = score.saturating_sub(weights.late_penalty);
    }
    if record.is_early_departure {
        score = score.saturating_sub(weights.early_departure_penalty);
    }
    score
}

/// Mean score over `records`, `None` when there are none.
pub fn average_score(records: &[&AttendanceRecord], weights: ScoreWeights) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: u32 = records
        .iter()
        .map(|r| calculate_performance_score(r, weights) as u32)
        .sum();
    Some(total as f64 / records.len() as f64)
}
