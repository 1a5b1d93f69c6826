use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::error::AppError;

/// Create the indexes the data model relies on. Idempotent.
///
/// - `users.email` unique: one account per login key.
/// - `profiles.user` unique: at most one profile per user.
/// - `posts.date` descending: newest-first listing.
/// - `posts.user`: account deletion.
pub async fn ensure_indexes(db: &mongodb::Database) -> Result<(), AppError> {
    create(db, "users", doc! { "email": 1 }, true).await?;
    create(db, "profiles", doc! { "user": 1 }, true).await?;
    create(db, "posts", doc! { "date": -1 }, false).await?;
    create(db, "posts", doc! { "user": 1 }, false).await?;

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}

async fn create(
    db: &mongodb::Database,
    collection: &str,
    keys: Document,
    unique: bool,
) -> Result<(), AppError> {
    let index = IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(unique).build())
        .build();

    db.collection::<Document>(collection)
        .create_index(index)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create index on {collection}: {e}")))?;

    Ok(())
}
