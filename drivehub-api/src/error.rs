use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use drivehub_core::CoreError;
use serde_json::{json, Value};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError { field: String, reason: String },
    Core(CoreError),
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    fn parts(self) -> (StatusCode, String, Value) {
        match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg, Value::Null),
            AppError::ValidationError { field, reason } => (
                StatusCode::BAD_REQUEST,
                format!("Validation failed on {field}: {reason}"),
                json!({ "field": field }),
            ),
            AppError::Core(err) => {
                let message = err.to_string();
                match err {
                    CoreError::ValidationError { field, .. } => {
                        (StatusCode::BAD_REQUEST, message, json!({ "field": field }))
                    }
                    CoreError::ConflictError(summary) => {
                        (StatusCode::CONFLICT, message, json!({ "conflict": summary }))
                    }
                    CoreError::InvalidTransition { from, to } => {
                        (StatusCode::CONFLICT, message, json!({ "from": from, "to": to }))
                    }
                    CoreError::NotFound { entity, id } => {
                        (StatusCode::NOT_FOUND, message, json!({ "entity": entity, "id": id }))
                    }
                    CoreError::StorageError { retryable: true, .. } => {
                        tracing::error!("Storage unavailable: {}", message);
                        (
                            StatusCode::SERVICE_UNAVAILABLE,
                            "Storage temporarily unavailable".to_string(),
                            json!({ "retryable": true }),
                        )
                    }
                    CoreError::StorageError { .. } => {
                        tracing::error!("Internal Server Error: {}", message);
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Internal Server Error".to_string(),
                            json!({ "retryable": false }),
                        )
                    }
                    CoreError::DocumentUploadError { document, .. } => {
                        tracing::error!("Document upload failed: {}", message);
                        (StatusCode::BAD_GATEWAY, message, json!({ "document": document }))
                    }
                    CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, Value::Null),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = self.parts();

        let body = Json(json!({
            "error": error_message,
            "details": details,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Core(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivehub_booking::ReservationStatus;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::validation("email", "is required"), StatusCode::BAD_REQUEST),
            (
                CoreError::InvalidTransition {
                    from: ReservationStatus::Completed,
                    to: ReservationStatus::Pending,
                },
                StatusCode::CONFLICT,
            ),
            (
                CoreError::StorageError {
                    message: "timeout".into(),
                    retryable: true,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CoreError::StorageError {
                    message: "constraint".into(),
                    retryable: false,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CoreError::DocumentUploadError {
                    document: "signature",
                    message: "disk full".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (CoreError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
