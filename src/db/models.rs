use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Generate a new document identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A registered account, stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Login key; unique across all users.
    pub email: String,
    /// PHC-format password hash. Never leaves the server.
    pub password: String,
    pub avatar: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

/// One profile per user, stored in the `profiles` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning user id; unique across all profiles.
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    /// Newest first.
    #[serde(default)]
    pub experience: Vec<Experience>,
    /// Newest first.
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub social: Social,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

/// Social network links. Only links that were submitted are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

impl Social {
    pub fn is_empty(&self) -> bool {
        self.links().next().is_none()
    }

    /// `(network, url)` pairs for every link that is set.
    pub fn links(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("youtube", &self.youtube),
            ("twitter", &self.twitter),
            ("facebook", &self.facebook),
            ("linkedin", &self.linkedin),
            ("instagram", &self.instagram),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    #[serde(rename = "_id")]
    pub id: String,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Scalar profile fields submitted for an upsert. `None` means "not
/// submitted" and leaves any stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
    pub githubusername: Option<String>,
    pub social: Social,
}

/// A post, stored in the `posts` collection with its likes and comments
/// embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    /// Author id.
    pub user: String,
    pub text: String,
    /// Author name at creation time.
    pub name: String,
    /// Author avatar at creation time.
    pub avatar: String,
    /// Newest first, at most one entry per user.
    #[serde(default)]
    pub likes: Vec<Like>,
    /// Newest first.
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
}

// -- API views --
//
// Stored timestamps are BSON datetimes; the views below carry the same data
// with plain RFC 3339 timestamps and without secrets.

/// A user as returned by `GET /api/auth`: no password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.avatar,
            date: user.date,
        }
    }
}

/// The public part of a user embedded in profile responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub avatar: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(rename = "_id")]
    pub id: String,
    /// `None` when the owning user no longer exists.
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub social: Social,
    pub date: DateTime<Utc>,
}

impl ProfileView {
    pub fn new(profile: Profile, user: Option<UserSummary>) -> Self {
        Self {
            id: profile.id,
            user,
            company: profile.company,
            website: profile.website,
            location: profile.location,
            status: profile.status,
            skills: profile.skills,
            bio: profile.bio,
            githubusername: profile.githubusername,
            experience: profile.experience,
            education: profile.education,
            social: profile.social,
            date: profile.date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            user: comment.user,
            text: comment.text,
            name: comment.name,
            avatar: comment.avatar,
            date: comment.date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub text: String,
    pub name: String,
    pub avatar: String,
    pub likes: Vec<Like>,
    pub comments: Vec<CommentView>,
    pub date: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            user: post.user,
            text: post.text,
            name: post.name,
            avatar: post.avatar,
            likes: post.likes,
            comments: post.comments.into_iter().map(CommentView::from).collect(),
            date: post.date,
        }
    }
}

/// Convert a stored comment list into its API representation.
pub fn comment_views(comments: Vec<Comment>) -> Vec<CommentView> {
    comments.into_iter().map(CommentView::from).collect()
}
