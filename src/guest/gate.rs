use std::fmt;

use axum::{
    extract::{FromRef, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info, warn};

use crate::{
    auth::{
        jwt::{JwtKeys, TokenError},
        repo_types::User,
    },
    error::AppError,
    state::AppState,
};

/// Requests a device may make before it has to log in.
pub const GUEST_QUOTA: i32 = 3;

pub const DEVICE_HEADER: &str = "x-device-id";

/// Who is behind a request that passed the usage gate.
#[derive(Debug, Clone)]
pub enum Caller {
    User(User),
    Guest { device_id: String, usage_count: i32 },
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::User(user) => write!(f, "user:{}", user.id),
            Caller::Guest {
                device_id,
                usage_count,
            } => write!(f, "guest:{device_id}#{usage_count}"),
        }
    }
}

/// Token part of the Authorization header. Clients send the literal strings
/// `null`/`undefined` when they hold no token; those count as absent.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.split_whitespace().nth(1)?;
    match token {
        "null" | "undefined" => None,
        t => Some(t),
    }
}

fn device_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(DEVICE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Decide whether a request may proceed and on whose behalf.
pub async fn admit(state: &AppState, headers: &HeaderMap) -> Result<Caller, AppError> {
    if let Some(token) = bearer_token(headers) {
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| match e {
            TokenError::Expired => {
                debug!("session token expired");
                AppError::ExpiredToken
            }
            TokenError::Invalid(e) => {
                warn!(error = %e, "invalid session token");
                AppError::InvalidToken
            }
        })?;

        let Some(user) = state.users.find_by_id(claims.sub).await? else {
            warn!(user_id = %claims.sub, "token for unknown user");
            return Err(AppError::InvalidToken);
        };
        return Ok(Caller::User(user));
    }

    let device_id = device_id(headers).ok_or(AppError::MissingDevice)?;
    match state.guests.try_consume(device_id, GUEST_QUOTA).await? {
        Some(usage_count) => {
            debug!(%device_id, usage_count, "guest use counted");
            Ok(Caller::Guest {
                device_id: device_id.to_string(),
                usage_count,
            })
        }
        None => {
            info!(%device_id, "guest quota exhausted");
            Err(AppError::QuotaExceeded { quota: GUEST_QUOTA })
        }
    }
}

/// Middleware guarding quota-protected routes; attaches [`Caller`] to the request.
pub async fn usage_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = admit(&state, req.headers()).await?;
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
