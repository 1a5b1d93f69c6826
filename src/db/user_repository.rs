use async_trait::async_trait;

use crate::db::models::User;
use crate::error::AppError;

/// Repository trait for user accounts.
///
/// This trait allows mocking the database layer in tests.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `DuplicateUser` if the email is taken.
    async fn insert(&self, user: User) -> Result<(), AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Fetch every user whose id is in `ids`. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError>;

    /// Delete a user; returns whether a document was removed.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, user: User) -> Result<(), AppError> {
        match self.collection.insert_one(&user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::DuplicateUser),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        use mongodb::bson::doc;

        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::doc;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.collection
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        use mongodb::bson::doc;

        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }
}
