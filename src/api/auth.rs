use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::api::users::TokenResponse;
use crate::app::AppState;
use crate::auth::password::verify_account_password;
use crate::auth::{AuthUser, TokenIssuer};
use crate::db::models::UserView;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::validation::Validator;

/// Login request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validate credentials and sign a session token.
///
/// Unknown email and wrong password fail identically, and both pay for a
/// password verification.
pub async fn process_login(
    users: &dyn UserRepository,
    tokens: &TokenIssuer,
    request: LoginRequest,
) -> Result<TokenResponse, AppError> {
    Validator::new()
        .email(request.email.as_deref(), "email", "Please include a valid email")
        .check(
            request.password.as_deref().is_some_and(|p| !p.is_empty()),
            "password",
            "Password is required",
        )
        .finish()?;

    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(AppError::InvalidCredentials);
    };

    let user = users.find_by_email(&email.trim().to_lowercase()).await?;
    let stored_hash = user.as_ref().map(|u| u.password.clone());
    let matched = verify_account_password(password, stored_hash).await?;

    let Some(user) = user.filter(|_| matched) else {
        return Err(AppError::InvalidCredentials);
    };

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(TokenResponse {
        token: tokens.issue(&user.id)?,
    })
}

/// Load the caller's own account, without the password.
pub async fn current_user(users: &dyn UserRepository, user_id: &str) -> Result<UserView, AppError> {
    users
        .find_by_id(user_id)
        .await?
        .map(UserView::from)
        .ok_or_else(|| AppError::Auth("User no longer exists".into()))
}

/// Axum handler for `POST /api/auth`.
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = process_login(state.user_repo.as_ref(), &state.tokens, request).await?;
    Ok(Json(response))
}

/// Axum handler for `GET /api/auth`.
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserView>, AppError> {
    let view = current_user(state.user_repo.as_ref(), &user.user_id).await?;
    Ok(Json(view))
}
