use async_trait::async_trait;
use mongodb::bson::{doc, Document};

use crate::db::models::{Comment, Like, Post};
use crate::error::AppError;

/// Repository trait for posts and their embedded likes/comments.
///
/// List mutations are conditional: the precondition (not yet liked, comment
/// owned by the caller, ...) is part of the update filter, so a `None`
/// result means either the post is gone or the precondition failed.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: Post) -> Result<(), AppError>;

    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<Post>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError>;

    /// Delete a post only if `user_id` owns it.
    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool, AppError>;

    /// Delete every post authored by `user_id`; returns how many were removed.
    async fn delete_by_user(&self, user_id: &str) -> Result<u64, AppError>;

    /// Prepend a like unless `like.user` already liked the post.
    async fn add_like(&self, post_id: &str, like: Like) -> Result<Option<Post>, AppError>;

    /// Remove the like of `user_id` if present.
    async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<Option<Post>, AppError>;

    /// Prepend a comment.
    async fn push_comment(&self, post_id: &str, comment: Comment) -> Result<Option<Post>, AppError>;

    /// Remove a comment if it exists and belongs to `user_id`.
    async fn pull_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> Result<Option<Post>, AppError>;
}

/// MongoDB implementation of the PostRepository.
pub struct MongoPostRepository {
    collection: mongodb::Collection<Post>,
}

impl MongoPostRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("posts"),
        }
    }

    async fn update_returning(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<Post>, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl PostRepository for MongoPostRepository {
    async fn insert(&self, post: Post) -> Result<(), AppError> {
        self.collection
            .insert_one(&post)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Post>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "date": -1 }).build();

        self.collection
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id, "user": user_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_many(doc! { "user": user_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn add_like(&self, post_id: &str, like: Like) -> Result<Option<Post>, AppError> {
        let user_id = like.user.clone();
        let like = bson::to_bson(&like)?;

        self.update_returning(
            doc! { "_id": post_id, "likes.user": { "$ne": user_id } },
            doc! { "$push": { "likes": { "$each": [like], "$position": 0 } } },
        )
        .await
    }

    async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<Option<Post>, AppError> {
        self.update_returning(
            doc! { "_id": post_id, "likes.user": user_id },
            doc! { "$pull": { "likes": { "user": user_id } } },
        )
        .await
    }

    async fn push_comment(&self, post_id: &str, comment: Comment) -> Result<Option<Post>, AppError> {
        let comment = bson::to_bson(&comment)?;

        self.update_returning(
            doc! { "_id": post_id },
            doc! { "$push": { "comments": { "$each": [comment], "$position": 0 } } },
        )
        .await
    }

    async fn pull_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> Result<Option<Post>, AppError> {
        self.update_returning(
            doc! {
                "_id": post_id,
                "comments": { "$elemMatch": { "_id": comment_id, "user": user_id } },
            },
            doc! { "$pull": { "comments": { "_id": comment_id } } },
        )
        .await
    }
}
