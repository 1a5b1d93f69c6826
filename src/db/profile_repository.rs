use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};

use crate::db::models::{new_id, Education, Experience, Profile, ProfileFields};
use crate::error::AppError;

/// Repository trait for profiles and their embedded experience/education
/// lists.
///
/// Every mutation is a single conditional update on the profile document.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create the profile for `user_id`, or overwrite only the submitted
    /// fields of the existing one. Returns the stored profile.
    async fn upsert(&self, user_id: &str, fields: ProfileFields) -> Result<Profile, AppError>;

    async fn find_by_user(&self, user_id: &str) -> Result<Option<Profile>, AppError>;

    async fn list(&self) -> Result<Vec<Profile>, AppError>;

    /// Prepend an entry. `None` when the user has no profile.
    async fn push_experience(
        &self,
        user_id: &str,
        entry: Experience,
    ) -> Result<Option<Profile>, AppError>;

    /// Remove an entry by id. `None` when the profile or the entry is absent.
    async fn pull_experience(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError>;

    async fn push_education(
        &self,
        user_id: &str,
        entry: Education,
    ) -> Result<Option<Profile>, AppError>;

    async fn pull_education(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError>;

    async fn delete_by_user(&self, user_id: &str) -> Result<bool, AppError>;
}

/// Build the update document for a profile upsert.
///
/// Social links are set by dotted path so links that were not submitted
/// survive an update.
pub(crate) fn upsert_update(fields: &ProfileFields, now: DateTime<Utc>) -> Document {
    let mut set = Document::new();

    let scalars = [
        ("company", &fields.company),
        ("website", &fields.website),
        ("location", &fields.location),
        ("status", &fields.status),
        ("bio", &fields.bio),
        ("githubusername", &fields.githubusername),
    ];
    for (key, value) in scalars {
        if let Some(value) = value {
            set.insert(key, value.as_str());
        }
    }
    if let Some(skills) = &fields.skills {
        set.insert("skills", skills.clone());
    }
    for (network, url) in fields.social.links() {
        set.insert(format!("social.{network}"), url);
    }

    let mut update = doc! {
        "$setOnInsert": {
            "_id": new_id(),
            "experience": [],
            "education": [],
            "date": bson::DateTime::from_chrono(now),
        }
    };
    if !set.is_empty() {
        update.insert("$set", set);
    }
    update
}

/// MongoDB implementation of the ProfileRepository.
pub struct MongoProfileRepository {
    collection: mongodb::Collection<Profile>,
}

impl MongoProfileRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("profiles"),
        }
    }

    async fn update_returning(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> Result<Option<Profile>, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .upsert(upsert)
            .build();

        self.collection
            .find_one_and_update(filter, update)
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn push_entry(
        &self,
        user_id: &str,
        list: &str,
        entry: Bson,
    ) -> Result<Option<Profile>, AppError> {
        let mut push = Document::new();
        push.insert(list, doc! { "$each": [entry], "$position": 0 });

        self.update_returning(doc! { "user": user_id }, doc! { "$push": push }, false)
            .await
    }

    async fn pull_entry(
        &self,
        user_id: &str,
        list: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError> {
        let mut filter = doc! { "user": user_id };
        filter.insert(format!("{list}._id"), entry_id);

        let mut pull = Document::new();
        pull.insert(list, doc! { "_id": entry_id });

        self.update_returning(filter, doc! { "$pull": pull }, false)
            .await
    }
}

#[async_trait]
impl ProfileRepository for MongoProfileRepository {
    async fn upsert(&self, user_id: &str, fields: ProfileFields) -> Result<Profile, AppError> {
        self.update_returning(
            doc! { "user": user_id },
            upsert_update(&fields, Utc::now()),
            true,
        )
        .await?
        .ok_or_else(|| AppError::Database("Upsert returned no document".into()))
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.collection
            .find_one(doc! { "user": user_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<Profile>, AppError> {
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

    async fn push_experience(
        &self,
        user_id: &str,
        entry: Experience,
    ) -> Result<Option<Profile>, AppError> {
        self.push_entry(user_id, "experience", bson::to_bson(&entry)?)
            .await
    }

    async fn pull_experience(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError> {
        self.pull_entry(user_id, "experience", entry_id).await
    }

    async fn push_education(
        &self,
        user_id: &str,
        entry: Education,
    ) -> Result<Option<Profile>, AppError> {
        self.push_entry(user_id, "education", bson::to_bson(&entry)?)
            .await
    }

    async fn pull_education(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError> {
        self.pull_entry(user_id, "education", entry_id).await
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "user": user_id })
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.deleted_count > 0)
    }
}
