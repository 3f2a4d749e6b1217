use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::attendance::{AttendanceRecord, BreakPeriod, BreakType};
use crate::service::Location;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationReq {
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = 24.7136)]
    pub latitude: f64,
    #[schema(example = 46.6753)]
    pub longitude: f64,
}

impl LocationReq {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BreakStartReq {
    #[schema(example = 1001)]
    pub employee_id: u64,
    pub break_type: BreakType,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BreakEndReq {
    #[schema(example = 1001)]
    pub employee_id: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AbsenceReq {
    #[schema(example = 1001)]
    pub employee_id: u64,
    /// Defaults to today
    #[schema(example = "2026-01-05", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

/// Inclusive date range for report queries.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    #[param(value_type = String, format = "date", example = "2026-01-01")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = "date", example = "2026-01-31")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookbackQuery {
    /// Days to scan back from today, defaults to 30
    #[param(example = 30)]
    pub lookback_days: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, format = "date", example = "2026-01-05")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionData {
    pub attendance: AttendanceRecord,
    #[serde(rename = "break", skip_serializing_if = "Option::is_none")]
    pub break_period: Option<BreakPeriod>,
    #[schema(example = "Checked in successfully")]
    pub message: String,
}

/// Envelope returned by every state-changing attendance endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    pub data: ActionData,
}

impl ActionResponse {
    pub fn new(attendance: AttendanceRecord, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: ActionData {
                attendance,
                break_period: None,
                message: message.into(),
            },
        }
    }

    pub fn with_break(mut self, period: BreakPeriod) -> Self {
        self.data.break_period = Some(period);
        self
    }
}
