use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiJson;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::db::models::{
    new_id, Education, Experience, Profile, ProfileFields, ProfileView, Social, UserSummary,
};
use crate::db::post_repository::PostRepository;
use crate::db::profile_repository::ProfileRepository;
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::validation::{non_blank, Validator};

/// Skills arrive as a comma-separated string from the form, or as a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

impl SkillsInput {
    /// Split on commas, trim each entry and drop empty ones.
    pub fn normalize(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            SkillsInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
            SkillsInput::List(list) => list,
        };
        raw.iter()
            .map(|skill| skill.trim())
            .filter(|skill| !skill.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Create/update profile request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    pub skills: Option<SkillsInput>,
    pub youtube: Option<String>,
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub linkedin: Option<String>,
    pub instagram: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EducationRequest {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub fieldofstudy: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub current: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Validate the date pair shared by experience and education entries.
/// A current entry has no end date, so any submitted `to` is ignored.
fn check_dates(
    validator: &mut Validator,
    from: Option<&str>,
    to: Option<&str>,
    current: bool,
) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let from_date = from.and_then(parse_date);
    validator.required(from, "from", "From date is required");
    if from.is_some_and(|f| !f.trim().is_empty()) {
        validator.check(from_date.is_some(), "from", "From date must be a valid date");
    }

    let to = to.filter(|t| !current && !t.trim().is_empty());
    let to_date = to.and_then(parse_date);
    validator.check(to.is_none() || to_date.is_some(), "to", "To date must be a valid date");
    if let (Some(from), Some(to)) = (from_date, to_date) {
        validator.check(to >= from, "to", "To date cannot be before from date");
    }

    (from_date, to_date)
}

/// The caller's account. A session token can outlive it.
async fn account(users: &dyn UserRepository, user_id: &str) -> Result<UserSummary, AppError> {
    users
        .find_by_id(user_id)
        .await?
        .as_ref()
        .map(UserSummary::from)
        .ok_or_else(|| AppError::Auth("User no longer exists".into()))
}

async fn with_owner(users: &dyn UserRepository, profile: Profile) -> Result<ProfileView, AppError> {
    let owner = users
        .find_by_id(&profile.user)
        .await?
        .as_ref()
        .map(UserSummary::from);
    Ok(ProfileView::new(profile, owner))
}

/// The caller's own profile.
pub async fn get_my_profile(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
) -> Result<ProfileView, AppError> {
    let profile = profiles
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no profile for this user".into()))?;
    with_owner(users, profile).await
}

/// Create the caller's profile or update the submitted fields in place.
pub async fn upsert_profile(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
    request: ProfileRequest,
) -> Result<ProfileView, AppError> {
    let status = non_blank(request.status);
    let skills = request
        .skills
        .map(SkillsInput::normalize)
        .filter(|skills| !skills.is_empty());

    Validator::new()
        .check(status.is_some(), "status", "Status is required")
        .check(skills.is_some(), "skills", "Skills is required")
        .finish()?;
    let owner = account(users, user_id).await?;

    let fields = ProfileFields {
        company: non_blank(request.company),
        website: non_blank(request.website),
        location: non_blank(request.location),
        status,
        skills,
        bio: non_blank(request.bio),
        githubusername: non_blank(request.githubusername),
        social: Social {
            youtube: non_blank(request.youtube),
            twitter: non_blank(request.twitter),
            facebook: non_blank(request.facebook),
            linkedin: non_blank(request.linkedin),
            instagram: non_blank(request.instagram),
        },
    };

    let profile = profiles.upsert(user_id, fields).await?;
    tracing::debug!(user_id = %user_id, profile_id = %profile.id, "Profile saved");
    Ok(ProfileView::new(profile, Some(owner)))
}

/// Every profile, each with its owner's public summary.
pub async fn list_profiles(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
) -> Result<Vec<ProfileView>, AppError> {
    let profiles = profiles.list().await?;

    let ids: Vec<String> = profiles.iter().map(|p| p.user.clone()).collect();
    let owners: HashMap<String, UserSummary> = users
        .find_by_ids(&ids)
        .await?
        .iter()
        .map(|user| (user.id.clone(), UserSummary::from(user)))
        .collect();

    Ok(profiles
        .into_iter()
        .map(|profile| {
            let owner = owners.get(&profile.user).cloned();
            ProfileView::new(profile, owner)
        })
        .collect())
}

pub async fn get_profile_by_user(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
) -> Result<ProfileView, AppError> {
    let profile = profiles
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
    with_owner(users, profile).await
}

/// Remove the caller's posts, then profile, then account.
///
/// Posts go first so a partial failure never leaves posts whose author
/// has vanished.
pub async fn delete_account(
    posts: &dyn PostRepository,
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
) -> Result<MessageResponse, AppError> {
    let removed_posts = posts.delete_by_user(user_id).await?;
    profiles.delete_by_user(user_id).await?;
    users.delete(user_id).await?;

    tracing::info!(user_id = %user_id, removed_posts, "Account deleted");
    Ok(MessageResponse {
        msg: "User deleted".into(),
    })
}

pub async fn add_experience(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
    request: ExperienceRequest,
) -> Result<ProfileView, AppError> {
    let mut validator = Validator::new();
    validator
        .required(request.title.as_deref(), "title", "Title is required")
        .required(request.company.as_deref(), "company", "Company is required");
    let current = request.current.unwrap_or(false);
    let (from, to) = check_dates(
        &mut validator,
        request.from.as_deref(),
        request.to.as_deref(),
        current,
    );
    validator.finish()?;
    let owner = account(users, user_id).await?;

    let (Some(title), Some(company), Some(from)) =
        (non_blank(request.title), non_blank(request.company), from)
    else {
        return Err(AppError::Internal("Validated fields missing".into()));
    };

    let entry = Experience {
        id: new_id(),
        title,
        company,
        location: non_blank(request.location),
        from,
        to,
        current,
        description: non_blank(request.description),
    };

    let profile = profiles
        .push_experience(user_id, entry)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no profile for this user".into()))?;
    Ok(ProfileView::new(profile, Some(owner)))
}

pub async fn remove_experience(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
    entry_id: &str,
) -> Result<ProfileView, AppError> {
    if profiles.find_by_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("There is no profile for this user".into()));
    }

    let profile = profiles
        .pull_experience(user_id, entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Experience not found".into()))?;
    with_owner(users, profile).await
}

pub async fn add_education(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
    request: EducationRequest,
) -> Result<ProfileView, AppError> {
    let mut validator = Validator::new();
    validator
        .required(request.school.as_deref(), "school", "School is required")
        .required(request.degree.as_deref(), "degree", "Degree is required")
        .required(
            request.fieldofstudy.as_deref(),
            "fieldofstudy",
            "Field of study is required",
        );
    let current = request.current.unwrap_or(false);
    let (from, to) = check_dates(
        &mut validator,
        request.from.as_deref(),
        request.to.as_deref(),
        current,
    );
    validator.finish()?;
    let owner = account(users, user_id).await?;

    let (Some(school), Some(degree), Some(fieldofstudy), Some(from)) = (
        non_blank(request.school),
        non_blank(request.degree),
        non_blank(request.fieldofstudy),
        from,
    ) else {
        return Err(AppError::Internal("Validated fields missing".into()));
    };

    let entry = Education {
        id: new_id(),
        school,
        degree,
        fieldofstudy,
        from,
        to,
        current,
        description: non_blank(request.description),
    };

    let profile = profiles
        .push_education(user_id, entry)
        .await?
        .ok_or_else(|| AppError::NotFound("There is no profile for this user".into()))?;
    Ok(ProfileView::new(profile, Some(owner)))
}

pub async fn remove_education(
    profiles: &dyn ProfileRepository,
    users: &dyn UserRepository,
    user_id: &str,
    entry_id: &str,
) -> Result<ProfileView, AppError> {
    if profiles.find_by_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("There is no profile for this user".into()));
    }

    let profile = profiles
        .pull_education(user_id, entry_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Education not found".into()))?;
    with_owner(users, profile).await
}

// -- Axum handlers --

/// `GET /api/profile/me`
pub async fn my_profile_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileView>, AppError> {
    let view = get_my_profile(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
    )
    .await?;
    Ok(Json(view))
}

/// `POST /api/profile`
pub async fn upsert_profile_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> Result<Json<ProfileView>, AppError> {
    let view = upsert_profile(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        request,
    )
    .await?;
    Ok(Json(view))
}

/// `GET /api/profile`
pub async fn list_profiles_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileView>>, AppError> {
    let views = list_profiles(state.profile_repo.as_ref(), state.user_repo.as_ref()).await?;
    Ok(Json(views))
}

/// `GET /api/profile/user/{user_id}`
pub async fn profile_by_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileView>, AppError> {
    let view = get_profile_by_user(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user_id,
    )
    .await?;
    Ok(Json(view))
}

/// `DELETE /api/profile`
pub async fn delete_account_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    let response = delete_account(
        state.post_repo.as_ref(),
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
    )
    .await?;
    Ok(Json(response))
}

/// `PATCH /api/profile/experience`
pub async fn add_experience_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ExperienceRequest>,
) -> Result<Json<ProfileView>, AppError> {
    let view = add_experience(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        request,
    )
    .await?;
    Ok(Json(view))
}

/// `DELETE /api/profile/experience/{exp_id}`
pub async fn remove_experience_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<String>,
) -> Result<Json<ProfileView>, AppError> {
    let view = remove_experience(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        &entry_id,
    )
    .await?;
    Ok(Json(view))
}

/// `PATCH /api/profile/education`
pub async fn add_education_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<EducationRequest>,
) -> Result<Json<ProfileView>, AppError> {
    let view = add_education(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        request,
    )
    .await?;
    Ok(Json(view))
}

/// `DELETE /api/profile/education/{edu_id}`
pub async fn remove_education_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Path(entry_id): Path<String>,
) -> Result<Json<ProfileView>, AppError> {
    let view = remove_education(
        state.profile_repo.as_ref(),
        state.user_repo.as_ref(),
        &user.user_id,
        &entry_id,
    )
    .await?;
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::{MockPostRepo, MockProfileRepo, MockUserRepo};
    use crate::db::models::{Like, Post, User};
    use chrono::Utc;

    fn seed_user(users: &MockUserRepo, id: &str, name: &str) {
        users.users.lock().unwrap().push(User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            password: "hash".to_string(),
            avatar: format!("https://avatar/{id}"),
            date: Utc::now(),
        });
    }

    fn profile_request(status: &str, skills: &str) -> ProfileRequest {
        ProfileRequest {
            status: Some(status.to_string()),
            skills: Some(SkillsInput::Csv(skills.to_string())),
            ..Default::default()
        }
    }

    fn experience(title: &str) -> ExperienceRequest {
        ExperienceRequest {
            title: Some(title.to_string()),
            company: Some("Acme".to_string()),
            from: Some("2019-03-01".to_string()),
            ..Default::default()
        }
    }

    fn education(school: &str) -> EducationRequest {
        EducationRequest {
            school: Some(school.to_string()),
            degree: Some("BSc".to_string()),
            fieldofstudy: Some("Computer Science".to_string()),
            from: Some("2012-09-01".to_string()),
            to: Some("2016-06-30".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_skills_normalization() {
        assert_eq!(
            SkillsInput::Csv(" rust, go ,, python ".into()).normalize(),
            vec!["rust", "go", "python"]
        );
        assert_eq!(
            SkillsInput::List(vec![" a ".into(), "".into(), "b".into()]).normalize(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_skills_input_accepts_string_or_list() {
        let csv: ProfileRequest = serde_json::from_str(r#"{"skills": "a, b"}"#).unwrap();
        assert!(matches!(csv.skills, Some(SkillsInput::Csv(_))));
        let list: ProfileRequest = serde_json::from_str(r#"{"skills": ["a", "b"]}"#).unwrap();
        assert!(matches!(list.skills, Some(SkillsInput::List(_))));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2020-02-29"), NaiveDate::from_ymd_opt(2020, 2, 29));
        assert_eq!(
            parse_date("2020-02-29T10:00:00Z"),
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
        assert_eq!(parse_date("29/02/2020"), None);
    }

    #[tokio::test]
    async fn test_upsert_requires_status_and_skills() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();

        let result = upsert_profile(&profiles, &users, "u1", ProfileRequest::default()).await;
        match result {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["status", "skills"]);
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
        assert!(profiles.profiles.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_partially() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");

        let mut first = profile_request("Developer", "rust, go");
        first.company = Some("Acme".into());
        first.twitter = Some("https://twitter.com/jane".into());
        let created = upsert_profile(&profiles, &users, "u1", first).await.unwrap();
        assert_eq!(created.skills, vec!["rust", "go"]);
        assert_eq!(created.user.as_ref().unwrap().name, "Jane Doe");

        let mut second = profile_request("Senior Developer", "rust");
        second.bio = Some("Hello".into());
        second.youtube = Some("https://youtube.com/jane".into());
        let updated = upsert_profile(&profiles, &users, "u1", second).await.unwrap();

        assert_eq!(profiles.profiles.lock().unwrap().len(), 1);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.status.as_deref(), Some("Senior Developer"));
        assert_eq!(updated.skills, vec!["rust"]);
        assert_eq!(updated.bio.as_deref(), Some("Hello"));
        // Omitted fields keep their previous values
        assert_eq!(updated.company.as_deref(), Some("Acme"));
        assert_eq!(updated.social.twitter.as_deref(), Some("https://twitter.com/jane"));
        assert_eq!(updated.social.youtube.as_deref(), Some("https://youtube.com/jane"));
    }

    #[tokio::test]
    async fn test_get_my_profile_missing() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        assert!(matches!(
            get_my_profile(&profiles, &users, "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_profiles_with_owners() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        seed_user(&users, "u2", "John Roe");
        seed_user(&users, "ghost", "Gone Soon");

        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();
        upsert_profile(&profiles, &users, "u2", profile_request("Ops", "k8s")).await.unwrap();
        upsert_profile(&profiles, &users, "ghost", profile_request("Dev", "go")).await.unwrap();
        // Account row removed behind the profile's back
        users.users.lock().unwrap().retain(|u| u.id != "ghost");

        let views = list_profiles(&profiles, &users).await.unwrap();
        assert_eq!(views.len(), 3);

        let names: Vec<Option<&str>> = views
            .iter()
            .map(|v| v.user.as_ref().map(|u| u.name.as_str()))
            .collect();
        assert!(names.contains(&Some("Jane Doe")));
        assert!(names.contains(&Some("John Roe")));
        assert!(names.contains(&None));
    }

    #[tokio::test]
    async fn test_experience_lifecycle() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();

        add_experience(&profiles, &users, "u1", experience("Junior")).await.unwrap();
        let view = add_experience(&profiles, &users, "u1", experience("Senior")).await.unwrap();

        // Newest first
        assert_eq!(view.experience[0].title, "Senior");
        assert_eq!(view.experience[1].title, "Junior");

        let junior_id = view.experience[1].id.clone();
        let view = remove_experience(&profiles, &users, "u1", &junior_id).await.unwrap();
        assert_eq!(view.experience.len(), 1);
        assert_eq!(view.experience[0].title, "Senior");
    }

    #[tokio::test]
    async fn test_remove_missing_experience_leaves_list_intact() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();
        add_experience(&profiles, &users, "u1", experience("Only")).await.unwrap();

        let result = remove_experience(&profiles, &users, "u1", "no-such-id").await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg.contains("Experience")));

        let stored = profiles.find_by_user("u1").await.unwrap().unwrap();
        assert_eq!(stored.experience.len(), 1);
    }

    #[tokio::test]
    async fn test_add_experience_without_profile() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        assert!(matches!(
            add_experience(&profiles, &users, "u1", experience("Dev")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_experience_validation() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();

        let request = ExperienceRequest {
            from: Some("not-a-date".into()),
            ..Default::default()
        };
        match add_experience(&profiles, &users, "u1", request).await {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "company", "from"]);
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_current_experience_drops_end_date() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();

        let mut request = experience("Lead");
        // Stale end date before the start date is ignored for a current role
        request.to = Some("2018-01-01".into());
        request.current = Some(true);
        let view = add_experience(&profiles, &users, "u1", request).await.unwrap();

        assert!(view.experience[0].current);
        assert!(view.experience[0].to.is_none());
    }

    #[tokio::test]
    async fn test_education_lifecycle() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();

        let view = add_education(&profiles, &users, "u1", education("MIT")).await.unwrap();
        assert_eq!(view.education[0].school, "MIT");
        assert_eq!(view.education[0].to, NaiveDate::from_ymd_opt(2016, 6, 30));

        let id = view.education[0].id.clone();
        assert!(matches!(
            remove_education(&profiles, &users, "u1", "missing").await,
            Err(AppError::NotFound(_))
        ));
        let view = remove_education(&profiles, &users, "u1", &id).await.unwrap();
        assert!(view.education.is_empty());
    }

    #[tokio::test]
    async fn test_education_end_before_start() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();

        let mut request = education("MIT");
        request.to = Some("2010-01-01".into());
        assert!(matches!(
            add_education(&profiles, &users, "u1", request).await,
            Err(AppError::Validation(errors)) if errors[0].field == "to"
        ));
    }

    #[tokio::test]
    async fn test_current_education_with_bad_end_date_is_accepted() {
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();

        let mut request = education("MIT");
        request.to = Some("not-a-date".into());
        request.current = Some(true);
        let view = add_education(&profiles, &users, "u1", request).await.unwrap();

        assert!(view.education[0].current);
        assert!(view.education[0].to.is_none());
    }

    #[tokio::test]
    async fn test_writes_after_account_deletion_are_rejected() {
        let posts = MockPostRepo::default();
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();
        delete_account(&posts, &profiles, &users, "u1").await.unwrap();

        assert!(matches!(
            upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await,
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            add_experience(&profiles, &users, "u1", experience("Dev")).await,
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            add_education(&profiles, &users, "u1", education("MIT")).await,
            Err(AppError::Auth(_))
        ));
        assert!(list_profiles(&profiles, &users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_account_removes_everything_owned() {
        let posts = MockPostRepo::default();
        let profiles = MockProfileRepo::default();
        let users = MockUserRepo::default();
        seed_user(&users, "u1", "Jane Doe");
        seed_user(&users, "u2", "John Roe");
        upsert_profile(&profiles, &users, "u1", profile_request("Dev", "rust")).await.unwrap();

        for (id, owner) in [("p1", "u1"), ("p2", "u1"), ("p3", "u2")] {
            posts.posts.lock().unwrap().push(Post {
                id: id.to_string(),
                user: owner.to_string(),
                text: "hi".to_string(),
                name: owner.to_string(),
                avatar: String::new(),
                likes: vec![Like { user: "u2".into() }],
                comments: vec![],
                date: Utc::now(),
            });
        }

        let response = delete_account(&posts, &profiles, &users, "u1").await.unwrap();
        assert_eq!(response.msg, "User deleted");

        let remaining: Vec<String> = posts.posts.lock().unwrap().iter().map(|p| p.id.clone()).collect();
        assert_eq!(remaining, vec!["p3"]);
        assert!(profiles.find_by_user("u1").await.unwrap().is_none());
        assert!(users.find_by_id("u1").await.unwrap().is_none());
        assert!(users.find_by_id("u2").await.unwrap().is_some());
    }
}
