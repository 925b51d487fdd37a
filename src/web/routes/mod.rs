//! Contains all the routes that this application can handle.

mod waitlist;

use axum::{http::StatusCode, routing::get, Router};

use crate::AppState;

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(app_state))
        .route("/health-check", get(health_check))
}

/// API - Routes nested under "/api" path
fn api_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/waitlist",
            get(waitlist::list)
                // Without an explicit HEAD route axum hands HEAD to the GET handler.
                .head(waitlist::method_not_allowed)
                .post(waitlist::signup)
                .options(waitlist::preflight)
                .fallback(waitlist::method_not_allowed),
        )
        .with_state(app_state)
}
