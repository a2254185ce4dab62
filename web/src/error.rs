//! HTTP error responses.
//!
//! [`AppError`] is the single error type returned by handlers. Registry
//! failures convert into it through `From<StallError>`, which fixes the
//! status code and machine-readable `code` for every business outcome.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nativenest_core::error::StallError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Serialised as `{"code": "...", "message": "..."}`. Internal details are
/// logged, never returned to the client.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<R>>) -> Result<Json<Stall>, AppError> {
///     let stall = state.registry.book_stall(event_id, stall_type_id, builder_id).await?;
///     Ok(Json(stall))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    /// Internal detail (for logging, not exposed to client)
    source: Option<String>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach an internal detail that is logged but not returned.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED")
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message.into(), "FORBIDDEN")
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), "NOT_FOUND")
    }

    /// Create a 409 Conflict error with a specific code.
    #[must_use]
    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code)
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR",
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

impl From<StallError> for AppError {
    fn from(err: StallError) -> Self {
        let message = err.to_string();
        match err {
            StallError::Validation(_) => Self::validation(message),
            StallError::CapacityExceeded { .. } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                message,
                "CAPACITY_EXCEEDED",
            ),
            StallError::NotFound { .. } => Self::not_found(message),
            StallError::NoAvailableStall { .. } => Self::conflict(message, "SOLD_OUT"),
            StallError::AlreadyCheckedIn { .. } => Self::conflict(message, "ALREADY_CHECKED_IN"),
            StallError::Database(detail) => {
                Self::internal("An internal error occurred").with_source(detail)
            }
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                error = self.source.as_deref().unwrap_or("none"),
                "Internal server error"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}
