use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use skywings_core::{CoreError, Role, User};
use skywings_store::credentials::{hash_password, verify_password};

use crate::{
    error::AppError,
    middleware::auth::{issue_token, require_user, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
struct SignupResponse {
    message: &'static str,
    user: User,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(from_fn_with_state(state, require_user));

    Router::new()
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/signup", post(signup))
        .merge(protected)
}

fn invalid_credentials() -> AppError {
    AppError::AuthenticationError("Invalid email or password".to_string())
}

async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid_credentials)?;
    if !verify_password(&req.password, &user.password_hash) {
        tracing::warn!("Failed sign-in for {}", user.email);
        return Err(invalid_credentials());
    }

    let token = issue_token(&Claims::for_user(&user, &state.auth), &state.auth)?;
    tracing::info!("User {} signed in", user.email);
    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer",
        user,
    }))
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = req.email.trim();
    if !email.contains('@') {
        return Err(AppError::ValidationError("A valid email is required".to_string()));
    }
    if req.password.len() < 6 {
        return Err(AppError::ValidationError(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::ValidationError("First and last name are required".to_string()));
    }

    let user = User::new(
        email,
        hash_password(&req.password)?,
        &req.first_name,
        &req.last_name,
        Role::User,
    );
    state.users.insert_user(user.clone()).await?;
    tracing::info!("Registered user {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully!",
            user,
        }),
    ))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| CoreError::not_found("User", claims.sub))?;
    Ok(Json(user))
}
