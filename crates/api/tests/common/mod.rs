#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use tower::ServiceExt;

use pixbyt_api::config::{BasicAuthCredentials, ServerConfig};
use pixbyt_api::router::build_app_router;
use pixbyt_api::state::AppState;
use pixbyt_core::launcher::Launcher;
use pixbyt_core::runner::AppRunner;

/// Build a test `ServerConfig` with safe defaults.
///
/// Binds to an ephemeral localhost port, disables the scheduler and auth,
/// and roots every process in `project_root`.
pub fn test_config(project_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        credentials: None,
        run_scheduler: false,
        project_root: project_root.to_path_buf(),
        meltano_command: "meltano".to_string(),
    }
}

pub fn credentials(username: &str, password: &str) -> BasicAuthCredentials {
    BasicAuthCredentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// A launcher whose "CLI" is an inline `sh` script: `meltano run clock`
/// arrives as `$1 = run`, `$2 = clock`.
pub fn fake_cli(script: &str, project_root: &Path) -> Launcher {
    Launcher::new("sh", project_root).with_base_args(["-c", script, "meltano"])
}

/// Write `script` to a file in `dir` and return a `MELTANO_COMMAND` value
/// that runs it with `sh`.
pub fn fake_cli_command(script: &str, dir: &Path) -> String {
    let path: PathBuf = dir.join("fake-meltano.sh");
    std::fs::write(&path, script).expect("write fake meltano script");
    format!("sh {}", path.display())
}

/// Build the full application router around `launcher`.
///
/// Uses the same [`build_app_router`] as production so tests exercise the
/// real middleware stack (auth, request ID, tracing, panic recovery).
pub fn build_test_app(config: ServerConfig, launcher: Launcher) -> Router {
    let state = AppState {
        config: Arc::new(config),
        runner: Arc::new(AppRunner::new(launcher)),
    };
    build_app_router(state)
}

pub async fn post(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_bytes(app: Router, uri: &str, body: Vec<u8>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_with_auth(
    app: Router,
    uri: &str,
    body: &str,
    username: &str,
    password: &str,
) -> Response {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Basic {encoded}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
