use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use pixbyt_core::error::CoreError;
use serde_json::json;

/// `WWW-Authenticate` challenge sent with every 401.
pub const BASIC_AUTH_CHALLENGE: &str = "Basic realm=\"pixbyt\"";

/// Application-level error type for HTTP handlers.
///
/// A failed app run is *not* an `AppError`: it is a regular response carrying
/// the captured output. These variants cover everything that prevents a run
/// from producing output at all, plus authentication rejections.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A process-level error from `pixbyt_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The request body cannot be handed to an app.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or mismatched Basic auth credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => {
                tracing::error!(error = %core, "Process error");
                let code = match core {
                    CoreError::Launch { .. } => "LAUNCH_ERROR",
                    CoreError::SchedulerStartup { .. } | CoreError::Io(_) => "PROCESS_ERROR",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, core.to_string())
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_AUTH_CHALLENGE),
            );
        }
        response
    }
}
