//! In-memory repositories for unit tests.
//!
//! Each mutation happens under one lock, mirroring the single conditional
//! update the MongoDB implementations issue.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::models::{
    new_id, Comment, Education, Experience, Like, Post, Profile, ProfileFields, Social, User,
};
use crate::db::post_repository::PostRepository;
use crate::db::profile_repository::ProfileRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

#[derive(Default)]
pub struct MockUserRepo {
    pub users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MockUserRepo {
    async fn insert(&self, user: User) -> Result<(), AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateUser);
        }
        users.push(user);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[derive(Default)]
pub struct MockProfileRepo {
    pub profiles: Mutex<Vec<Profile>>,
}

impl MockProfileRepo {
    fn update<F>(&self, user_id: &str, mutate: F) -> Option<Profile>
    where
        F: FnOnce(&mut Profile) -> bool,
    {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.iter_mut().find(|p| p.user == user_id)?;
        mutate(&mut *profile).then(|| profile.clone())
    }
}

#[async_trait]
impl ProfileRepository for MockProfileRepo {
    async fn upsert(&self, user_id: &str, fields: ProfileFields) -> Result<Profile, AppError> {
        let mut profiles = self.profiles.lock().unwrap();
        let index = match profiles.iter().position(|p| p.user == user_id) {
            Some(index) => index,
            None => {
                profiles.push(Profile {
                    id: new_id(),
                    user: user_id.to_string(),
                    company: None,
                    website: None,
                    location: None,
                    status: None,
                    skills: vec![],
                    bio: None,
                    githubusername: None,
                    experience: vec![],
                    education: vec![],
                    social: Default::default(),
                    date: Utc::now(),
                });
                profiles.len() - 1
            }
        };

        let profile = &mut profiles[index];
        let ProfileFields {
            company,
            website,
            location,
            status,
            skills,
            bio,
            githubusername,
            social,
        } = fields;
        profile.company = company.or(profile.company.take());
        profile.website = website.or(profile.website.take());
        profile.location = location.or(profile.location.take());
        profile.status = status.or(profile.status.take());
        profile.bio = bio.or(profile.bio.take());
        profile.githubusername = githubusername.or(profile.githubusername.take());
        if let Some(skills) = skills {
            profile.skills = skills;
        }
        merge_social(&mut profile.social, social);

        Ok(profile.clone())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user == user_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Profile>, AppError> {
        let mut profiles = self.profiles.lock().unwrap().clone();
        profiles.reverse();
        profiles.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(profiles)
    }

    async fn push_experience(
        &self,
        user_id: &str,
        entry: Experience,
    ) -> Result<Option<Profile>, AppError> {
        Ok(self.update(user_id, |p| {
            p.experience.insert(0, entry);
            true
        }))
    }

    async fn pull_experience(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError> {
        Ok(self.update(user_id, |p| {
            let before = p.experience.len();
            p.experience.retain(|e| e.id != entry_id);
            p.experience.len() != before
        }))
    }

    async fn push_education(
        &self,
        user_id: &str,
        entry: Education,
    ) -> Result<Option<Profile>, AppError> {
        Ok(self.update(user_id, |p| {
            p.education.insert(0, entry);
            true
        }))
    }

    async fn pull_education(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Profile>, AppError> {
        Ok(self.update(user_id, |p| {
            let before = p.education.len();
            p.education.retain(|e| e.id != entry_id);
            p.education.len() != before
        }))
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<bool, AppError> {
        let mut profiles = self.profiles.lock().unwrap();
        let before = profiles.len();
        profiles.retain(|p| p.user != user_id);
        Ok(profiles.len() != before)
    }
}

#[derive(Default)]
pub struct MockPostRepo {
    pub posts: Mutex<Vec<Post>>,
}

impl MockPostRepo {
    fn update<F>(&self, post_id: &str, mutate: F) -> Option<Post>
    where
        F: FnOnce(&mut Post) -> bool,
    {
        let mut posts = self.posts.lock().unwrap();
        let post = posts.iter_mut().find(|p| p.id == post_id)?;
        mutate(&mut *post).then(|| post.clone())
    }
}

#[async_trait]
impl PostRepository for MockPostRepo {
    async fn insert(&self, post: Post) -> Result<(), AppError> {
        self.posts.lock().unwrap().push(post);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Post>, AppError> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.reverse();
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn delete_owned(&self, id: &str, user_id: &str) -> Result<bool, AppError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| !(p.id == id && p.user == user_id));
        Ok(posts.len() != before)
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64, AppError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.user != user_id);
        Ok((before - posts.len()) as u64)
    }

    async fn add_like(&self, post_id: &str, like: Like) -> Result<Option<Post>, AppError> {
        Ok(self.update(post_id, |p| {
            if p.likes.iter().any(|l| l.user == like.user) {
                return false;
            }
            p.likes.insert(0, like);
            true
        }))
    }

    async fn remove_like(&self, post_id: &str, user_id: &str) -> Result<Option<Post>, AppError> {
        Ok(self.update(post_id, |p| {
            let before = p.likes.len();
            p.likes.retain(|l| l.user != user_id);
            p.likes.len() != before
        }))
    }

    async fn push_comment(&self, post_id: &str, comment: Comment) -> Result<Option<Post>, AppError> {
        Ok(self.update(post_id, |p| {
            p.comments.insert(0, comment);
            true
        }))
    }

    async fn pull_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        user_id: &str,
    ) -> Result<Option<Post>, AppError> {
        Ok(self.update(post_id, |p| {
            let before = p.comments.len();
            p.comments
                .retain(|c| !(c.id == comment_id && c.user == user_id));
            p.comments.len() != before
        }))
    }
}

/// Overwrite the submitted links, keeping the rest.
fn merge_social(stored: &mut Social, submitted: Social) {
    let Social {
        youtube,
        twitter,
        facebook,
        linkedin,
        instagram,
    } = submitted;
    stored.youtube = youtube.or(stored.youtube.take());
    stored.twitter = twitter.or(stored.twitter.take());
    stored.facebook = facebook.or(stored.facebook.take());
    stored.linkedin = linkedin.or(stored.linkedin.take());
    stored.instagram = instagram.or(stored.instagram.take());
}
