use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    http::StatusCode,
    response::Html,
    Extension, Json,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, MessageResponse, PublicUser, RegisterRequest,
            UserDataResponse,
        },
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        validate::{login_credentials, register_credentials},
        verification::{new_verification_token, VERIFIED_PAGE, VERIFY_FAILED_PAGE},
    },
    error::AppError,
    guest::Caller,
    mailer::dispatch_verification,
    state::AppState,
};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::validation(e.body_text()))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let creds = register_credentials(body(payload)?)?;

    if state.users.find_by_email(&creds.email).await?.is_some() {
        warn!(email = %creds.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let hash = hash_password(&creds.password).await?;
    let token = new_verification_token();

    let Some(user) = state.users.create(&creds.email, &hash, &token).await? else {
        warn!(email = %creds.email, "email registered concurrently");
        return Err(AppError::DuplicateEmail);
    };

    dispatch_verification(
        state.mailer.clone(),
        &state.config.public_url,
        user.email.clone(),
        &token,
    );

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "User registered successfully.",
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let creds = login_credentials(body(payload)?)?;

    let Some(user) = state.users.find_by_email(&creds.email).await? else {
        warn!(email = %creds.email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&creds.password, &user.password_hash).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_verified {
        let token = new_verification_token();
        state.users.set_verification_token(user.id, &token).await?;
        dispatch_verification(
            state.mailer.clone(),
            &state.config.public_url,
            user.email.clone(),
            &token,
        );
        info!(user_id = %user.id, "login blocked until email is verified");
        return Err(AppError::EmailNotVerified);
    }

    let token = JwtKeys::from_ref(&state).sign(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        message: "User successfully logged in",
        token,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    }))
}

#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> (StatusCode, Html<&'static str>) {
    match state.users.consume_verification_token(&token).await {
        Ok(Some(user)) => {
            info!(user_id = %user.id, "email verified");
            (StatusCode::OK, Html(VERIFIED_PAGE))
        }
        Ok(None) => {
            warn!("unknown or consumed verification token");
            (StatusCode::BAD_REQUEST, Html(VERIFY_FAILED_PAGE))
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "verify email failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(VERIFY_FAILED_PAGE))
        }
    }
}

#[instrument(skip_all, fields(caller = %caller))]
pub async fn get_data(
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserDataResponse>, AppError> {
    match caller {
        Caller::User(user) => Ok(Json(UserDataResponse {
            success: true,
            data: PublicUser {
                id: user.id,
                email: user.email,
            },
        })),
        Caller::Guest { .. } => Err(AppError::Unauthorized),
    }
}
