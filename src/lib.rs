pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod validation;
pub mod api {
    pub mod auth;
    pub mod errors;
    pub mod github;
    pub mod posts;
    pub mod profile;
    pub mod users;
}
pub mod db {
    pub mod indexes;
    pub mod models;
    pub mod post_repository;
    pub mod profile_repository;
    pub mod user_repository;

    #[cfg(test)]
    pub mod mock;
}
