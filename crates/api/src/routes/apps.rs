use axum::routing::post;
use axum::Router;

use crate::handlers::apps;
use crate::state::AppState;

/// Mount app routes.
///
/// ```text
/// /apps/{app_name}/update                          run app (POST)
/// /apps/{app_name}/notify                          run app as notification (POST)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apps/{app_name}/update", post(apps::update_app))
        .route("/apps/{app_name}/notify", post(apps::notify_app))
}
