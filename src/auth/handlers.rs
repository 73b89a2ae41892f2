use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        errors::{AuthError, Op},
        password,
        repo_types::NewUser,
        services::{is_strong_enough, is_valid_email, normalize_email},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn ensure_configured(state: &AppState) -> Result<(), AuthError> {
    if state.config.is_configured() {
        Ok(())
    } else {
        error!("DATABASE_URL is not set");
        Err(AuthError::Config)
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "unreadable register body");
        AuthError::InvalidBody
    })?;
    let (email, password) = payload.fields().ok_or(AuthError::MissingFields)?;

    if !is_valid_email(email) {
        warn!("invalid email");
        return Err(AuthError::InvalidEmail);
    }
    if !is_strong_enough(password) {
        warn!("password too short");
        return Err(AuthError::WeakPassword);
    }
    ensure_configured(&state)?;

    let email = normalize_email(email);

    // Fast path; the unique index decides on insert.
    match state.users.find_by_email(&email).await {
        Ok(Some(_)) => {
            warn!(email = %email, "email already registered");
            return Err(AuthError::DuplicateUser);
        }
        Ok(None) => {}
        Err(e) => return Err(AuthError::from_store(Op::Register, e)),
    }

    let password_hash = password::hash(password.to_owned())
        .await
        .map_err(|e| AuthError::internal(Op::Register, e))?;

    let user_id = state
        .users
        .insert(NewUser {
            email: email.clone(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .map_err(|e| AuthError::from_store(Op::Register, e))?
        .ok_or(AuthError::InsertFailed)?;

    info!(user_id = %user_id, email = %email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user_id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "unreadable login body");
        AuthError::InvalidBody
    })?;
    let (email, password) = payload.fields().ok_or(AuthError::MissingFields)?;
    ensure_configured(&state)?;

    let email = normalize_email(email);
    debug!(email = %email, "login attempt");

    let user = match state.users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => return Err(AuthError::from_store(Op::Login, e)),
    };

    let ok = password::verify(password.to_owned(), user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(user_id = %user.id, "stored password digest is unusable");
            AuthError::AuthSystem(e)
        })?;

    if !ok {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        user_id: user.id,
        email: user.email,
    }))
}
