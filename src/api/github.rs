use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::error::AppError;
use crate::github::RepoLookup;

/// Recent public repositories of a GitHub user, passed through as returned.
pub async fn github_repos(
    github: &dyn RepoLookup,
    username: &str,
) -> Result<serde_json::Value, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("GitHub username is required".into()));
    }
    github.public_repos(username).await
}

/// `GET /api/profile/github/{username}`
pub async fn github_repos_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(github_repos(state.github.as_ref(), &username).await?))
}
