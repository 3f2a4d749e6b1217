use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Every failure the attendance engine can surface.
///
/// All variants are deterministic: the same input produces the same error,
/// and nothing in this crate retries.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// Malformed time ranges, out-of-bounds coordinates, negative grace periods.
    #[error("{0}")]
    Validation(String),

    /// Duplicate check-in, check-out without check-in, break in the wrong state.
    #[error("{0}")]
    Conflict(String),

    /// Unknown employee, shift policy or record.
    #[error("{0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;

impl AttendanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::Conflict(_) => StatusCode::CONFLICT,
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AttendanceError::Storage(e) => {
                tracing::error!(error = %e, "Attendance storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(
            AttendanceError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AttendanceError::conflict("dup").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AttendanceError::not_found("who").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn storage_errors_hide_details() {
        let err = AttendanceError::Storage(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Internal Server Error"));
    }

    #[actix_web::test]
    async fn business_errors_carry_their_message() {
        let resp = AttendanceError::conflict("Already checked in today").error_response();
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], json!("Already checked in today"));
    }
}
