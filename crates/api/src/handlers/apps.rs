//! Handlers for the `/apps/{app_name}` resource.
//!
//! Both endpoints run `meltano run <app_name>` with the request body as input
//! and relay the captured output. App names are not validated: an unknown app
//! simply makes the CLI fail, which is reported like any other failed run.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pixbyt_core::env::AppEnv;
use pixbyt_core::runner::RunResult;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response body for an app run.
///
/// Serializes as `{"output": [...]}` on success (200) and `{"error": [...]}`
/// on failure (500); both carry the same captured lines.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunResponse {
    Output(Vec<String>),
    Error(Vec<String>),
}

impl RunResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Output(_) => StatusCode::OK,
            Self::Error(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RunResult> for RunResponse {
    fn from(result: RunResult) -> Self {
        if result.success {
            Self::Output(result.output)
        } else {
            Self::Error(result.output)
        }
    }
}

impl IntoResponse for RunResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// POST /apps/{app_name}/update
///
/// Run the app with the raw request body as `TAP_PIXLET_APP_INPUT`.
pub async fn update_app(
    State(state): State<AppState>,
    Path(app_name): Path<String>,
    body: Bytes,
) -> AppResult<RunResponse> {
    run_app(&state, &app_name, decode_input(&body)?, &AppEnv::default()).await
}

/// POST /apps/{app_name}/notify
///
/// Same as update, but always pushes to the `notification` installation in
/// the foreground.
pub async fn notify_app(
    State(state): State<AppState>,
    Path(app_name): Path<String>,
    body: Bytes,
) -> AppResult<RunResponse> {
    run_app(&state, &app_name, decode_input(&body)?, &AppEnv::notification()).await
}

/// The body becomes an environment variable, so it must be UTF-8.
fn decode_input(body: &[u8]) -> AppResult<&str> {
    std::str::from_utf8(body)
        .map_err(|err| AppError::InvalidInput(format!("Request body is not valid UTF-8: {err}")))
}

async fn run_app(
    state: &AppState,
    app_name: &str,
    input: &str,
    env: &AppEnv,
) -> AppResult<RunResponse> {
    let result = state.runner.run(app_name, input, env).await?;
    Ok(result.into())
}
