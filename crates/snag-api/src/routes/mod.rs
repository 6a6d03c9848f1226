//! Route modules. Each defines an Axum router for one API surface area;
//! they are assembled here and served from `main.rs`.

pub mod attachments;
pub mod comments;
pub mod defects;
pub mod health;
pub mod projects;
pub mod stats;
pub mod users;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The complete application router with middleware applied.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(defects::router())
        .merge(comments::router())
        .merge(attachments::router())
        .merge(users::router())
        .merge(projects::router())
        .merge(stats::router());

    Router::new()
        .nest("/api", api)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
