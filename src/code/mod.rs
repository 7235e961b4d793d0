pub mod handlers;
pub mod upload;

use axum::{extract::DefaultBodyLimit, middleware, routing::post, Router};

use crate::{guest::usage_gate, state::AppState};

/// Routes under `/api/user`, all behind the usage gate.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/review/code/review", post(handlers::review_code))
        .route("/review/code/fixes", post(handlers::suggest_fixes))
        .route("/doc/code/generateDoc", post(handlers::generate_documentation))
        .route(
            "/analysis/code/analysis-complexity",
            post(handlers::analyze_complexity),
        )
        .route_layer(middleware::from_fn_with_state(state, usage_gate))
        .layer(DefaultBodyLimit::max(upload::MAX_BODY_BYTES))
}
