use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{guest::usage_gate, rate_limit, rate_limit::RateLimiter, state::AppState};

pub mod claims;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod validate;
pub mod verification;

/// Routes under `/api/auth`.
pub fn router(state: AppState) -> Router<AppState> {
    let register_limit = Arc::new(RateLimiter::register());
    let login_limit = Arc::new(RateLimiter::login());

    Router::new()
        .route(
            "/register",
            post(handlers::register).layer(middleware::from_fn_with_state(
                register_limit,
                rate_limit::limit,
            )),
        )
        .route(
            "/login",
            post(handlers::login)
                .layer(middleware::from_fn_with_state(login_limit, rate_limit::limit)),
        )
        .route("/verify-email/:token", get(handlers::verify_email))
        .route(
            "/user/get-data",
            get(handlers::get_data).layer(middleware::from_fn_with_state(state, usage_gate)),
        )
}
