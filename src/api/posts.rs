use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::api::profile::MessageResponse;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::db::models::{comment_views, new_id, Comment, CommentView, Like, Post, PostView, User};
use crate::db::post_repository::PostRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::validation::{non_blank, Validator};

/// Body of `POST /api/posts` and `POST /api/posts/comment/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}

impl TextRequest {
    fn into_text(self) -> Result<String, AppError> {
        let text = non_blank(self.text);
        Validator::new()
            .check(text.is_some(), "text", "Text is required")
            .finish()?;
        text.ok_or_else(|| AppError::Internal("Validated fields missing".into()))
    }
}

/// The author of a new post or comment. A valid token whose account has
/// since been deleted is treated as unauthenticated.
async fn author(users: &dyn UserRepository, user_id: &str) -> Result<User, AppError> {
    users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User no longer exists".into()))
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".into())
}

pub async fn create_post(
    posts: &dyn PostRepository,
    users: &dyn UserRepository,
    user_id: &str,
    request: TextRequest,
) -> Result<PostView, AppError> {
    let text = request.into_text()?;
    let author = author(users, user_id).await?;

    let post = Post {
        id: new_id(),
        user: author.id,
        text,
        name: author.name,
        avatar: author.avatar,
        likes: vec![],
        comments: vec![],
        date: Utc::now(),
    };
    posts.insert(post.clone()).await?;

    tracing::debug!(post_id = %post.id, user_id = %user_id, "Post created");
    Ok(PostView::from(post))
}

/// All posts, newest first.
pub async fn list_posts(posts: &dyn PostRepository) -> Result<Vec<PostView>, AppError> {
    Ok(posts.list().await?.into_iter().map(PostView::from).collect())
}

pub async fn get_post(posts: &dyn PostRepository, post_id: &str) -> Result<PostView, AppError> {
    posts
        .find_by_id(post_id)
        .await?
        .map(PostView::from)
        .ok_or_else(post_not_found)
}

pub async fn delete_post(
    posts: &dyn PostRepository,
    user_id: &str,
    post_id: &str,
) -> Result<MessageResponse, AppError> {
    let post = posts.find_by_id(post_id).await?.ok_or_else(post_not_found)?;
    if post.user != user_id {
        return Err(AppError::NotAuthorized("User not authorized".into()));
    }

    // Ownership is re-checked by the delete filter; losing a race to a
    // concurrent delete looks the same as the post never existing.
    if !posts.delete_owned(post_id, user_id).await? {
        return Err(post_not_found());
    }

    tracing::info!(post_id = %post_id, user_id = %user_id, "Post removed");
    Ok(MessageResponse {
        msg: "Post removed".into(),
    })
}

/// Like a post. Returns the updated likes list only.
pub async fn like_post(
    posts: &dyn PostRepository,
    user_id: &str,
    post_id: &str,
) -> Result<Vec<Like>, AppError> {
    let like = Like {
        user: user_id.to_string(),
    };
    match posts.add_like(post_id, like).await? {
        Some(post) => Ok(post.likes),
        None => match posts.find_by_id(post_id).await? {
            Some(_) => Err(AppError::AlreadyLiked),
            None => Err(post_not_found()),
        },
    }
}

/// Withdraw a like. Returns the updated likes list only.
pub async fn unlike_post(
    posts: &dyn PostRepository,
    user_id: &str,
    post_id: &str,
) -> Result<Vec<Like>, AppError> {
    match posts.remove_like(post_id, user_id).await? {
        Some(post) => Ok(post.likes),
        None => match posts.find_by_id(post_id).await? {
            Some(_) => Err(AppError::NotLiked),
            None => Err(post_not_found()),
        },
    }
}

/// Comment on a post. Returns the full updated comment list.
pub async fn add_comment(
    posts: &dyn PostRepository,
    users: &dyn UserRepository,
    user_id: &str,
    post_id: &str,
    request: TextRequest,
) -> Result<Vec<CommentView>, AppError> {
    let text = request.into_text()?;
    let author = author(users, user_id).await?;

    let comment = Comment {
        id: new_id(),
        user: author.id,
        text,
        name: author.name,
        avatar: author.avatar,
        date: Utc::now(),
    };

    let post = posts
        .push_comment(post_id, comment)
        .await?
        .ok_or_else(post_not_found)?;
    Ok(comment_views(post.comments))
}

/// Delete one of the caller's own comments. Returns the updated comment list.
pub async fn remove_comment(
    posts: &dyn PostRepository,
    user_id: &str,
    post_id: &str,
    comment_id: &str,
) -> Result<Vec<CommentView>, AppError> {
    let post = posts.find_by_id(post_id).await?.ok_or_else(post_not_found)?;
    let comment = post
        .comments
        .iter()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| AppError::NotFound("Comment does not exist".into()))?;
    if comment.user != user_id {
        return Err(AppError::NotAuthorized("User not authorized".into()));
    }

    let post = posts
        .pull_comment(post_id, comment_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment does not exist".into()))?;
    Ok(comment_views(post.comments))
}

// -- Axum handlers --

/// `POST /api/posts`
pub async fn create_post_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<TextRequest>,
) -> Result<Json<PostView>, AppError> {
    let view = create_post(
        state.post_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        request,
    )
    .await?;
    Ok(Json(view))
}

/// `GET /api/posts`
pub async fn list_posts_handler(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<PostView>>, AppError> {
    Ok(Json(list_posts(state.post_repo.as_ref()).await?))
}

/// `GET /api/posts/{id}`
pub async fn get_post_handler(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<PostView>, AppError> {
    Ok(Json(get_post(state.post_repo.as_ref(), &post_id).await?))
}

/// `DELETE /api/posts/{id}`
pub async fn delete_post_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let response = delete_post(state.post_repo.as_ref(), &user.user_id, &post_id).await?;
    Ok(Json(response))
}

/// `PATCH /api/posts/like/{id}`
pub async fn like_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<Like>>, AppError> {
    let likes = like_post(state.post_repo.as_ref(), &user.user_id, &post_id).await?;
    Ok(Json(likes))
}

/// `PATCH /api/posts/unlike/{id}`
pub async fn unlike_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<Like>>, AppError> {
    let likes = unlike_post(state.post_repo.as_ref(), &user.user_id, &post_id).await?;
    Ok(Json(likes))
}

/// `POST /api/posts/comment/{id}`
pub async fn add_comment_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<String>,
    ApiJson(request): ApiJson<TextRequest>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let comments = add_comment(
        state.post_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        &post_id,
        request,
    )
    .await?;
    Ok(Json(comments))
}

/// `DELETE /api/posts/comment/{id}/{comment_id}`
pub async fn remove_comment_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let comments = remove_comment(
        state.post_repo.as_ref(),
        &user.user_id,
        &post_id,
        &comment_id,
    )
    .await?;
    Ok(Json(comments))
}
