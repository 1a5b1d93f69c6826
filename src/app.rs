use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::TokenIssuer;
use crate::db::post_repository::PostRepository;
use crate::db::profile_repository::ProfileRepository;
use crate::db::user_repository::UserRepository;
use crate::github::RepoLookup;

/// Shared application state, passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub post_repo: Arc<dyn PostRepository>,
    pub github: Arc<dyn RepoLookup>,
    pub tokens: Arc<TokenIssuer>,
}

impl FromRef<AppState> for Arc<TokenIssuer> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Build the full HTTP surface under `/api`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", post(api::users::register_handler))
        .route(
            "/api/auth",
            get(api::auth::me_handler).post(api::auth::login_handler),
        )
        .route(
            "/api/profile",
            get(api::profile::list_profiles_handler)
                .post(api::profile::upsert_profile_handler)
                .delete(api::profile::delete_account_handler),
        )
        .route("/api/profile/me", get(api::profile::my_profile_handler))
        .route(
            "/api/profile/user/{user_id}",
            get(api::profile::profile_by_user_handler),
        )
        .route(
            "/api/profile/experience",
            patch(api::profile::add_experience_handler),
        )
        .route(
            "/api/profile/experience/{exp_id}",
            delete(api::profile::remove_experience_handler),
        )
        .route(
            "/api/profile/education",
            patch(api::profile::add_education_handler),
        )
        .route(
            "/api/profile/education/{edu_id}",
            delete(api::profile::remove_education_handler),
        )
        .route(
            "/api/profile/github/{username}",
            get(api::github::github_repos_handler),
        )
        .route(
            "/api/posts",
            get(api::posts::list_posts_handler).post(api::posts::create_post_handler),
        )
        .route(
            "/api/posts/{id}",
            get(api::posts::get_post_handler).delete(api::posts::delete_post_handler),
        )
        .route("/api/posts/like/{id}", patch(api::posts::like_handler))
        .route("/api/posts/unlike/{id}", patch(api::posts::unlike_handler))
        .route(
            "/api/posts/comment/{id}",
            post(api::posts::add_comment_handler),
        )
        .route(
            "/api/posts/comment/{id}/{comment_id}",
            delete(api::posts::remove_comment_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
