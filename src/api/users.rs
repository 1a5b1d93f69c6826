use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::avatar::avatar_url;
use crate::auth::password::hash_password_blocking;
use crate::auth::TokenIssuer;
use crate::db::models::{new_id, User};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::validation::Validator;

/// Registration request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Returned by registration and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Register a new account and sign a session token for it.
pub async fn process_register(
    users: &dyn UserRepository,
    tokens: &TokenIssuer,
    request: RegisterRequest,
) -> Result<TokenResponse, AppError> {
    Validator::new()
        .min_chars(
            request.name.as_deref(),
            5,
            "name",
            "Name is required and must be at least 5 characters",
        )
        .email(request.email.as_deref(), "email", "Please include a valid email")
        .check(
            request.password.as_deref().is_some_and(|p| p.chars().count() >= 6),
            "password",
            "Please enter a password with 6 or more characters",
        )
        .finish()?;

    let (Some(name), Some(email), Some(password)) = (request.name, request.email, request.password)
    else {
        return Err(AppError::Internal("Validated fields missing".into()));
    };
    let email = email.trim().to_lowercase();

    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::DuplicateUser);
    }

    let user = User {
        id: new_id(),
        name: name.trim().to_string(),
        avatar: avatar_url(&email),
        email,
        password: hash_password_blocking(password).await?,
        date: Utc::now(),
    };
    let user_id = user.id.clone();

    users.insert(user).await?;
    tracing::info!(user_id = %user_id, "Registered new user");

    Ok(TokenResponse {
        token: tokens.issue(&user_id)?,
    })
}

/// Axum handler for `POST /api/users`.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = process_register(state.user_repo.as_ref(), &state.tokens, request).await?;
    Ok(Json(response))
}
