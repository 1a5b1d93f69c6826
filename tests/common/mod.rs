use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use devconnect::app::{self, AppState};
use devconnect::auth::TokenIssuer;
use devconnect::db::indexes::ensure_indexes;
use devconnect::db::post_repository::{MongoPostRepository, PostRepository};
use devconnect::db::profile_repository::{MongoProfileRepository, ProfileRepository};
use devconnect::db::user_repository::{MongoUserRepository, UserRepository};
use devconnect::error::AppError;
use devconnect::github::RepoLookup;

/// Canned repo lookup: `octocat` has one repository, everyone else is
/// an upstream failure.
pub struct StubGithub;

#[async_trait]
impl RepoLookup for StubGithub {
    async fn public_repos(&self, username: &str) -> Result<serde_json::Value, AppError> {
        match username {
            "octocat" => Ok(serde_json::json!([{ "name": "hello-world", "html_url": "https://github.com/octocat/hello-world" }])),
            other => Err(AppError::Upstream(format!("GitHub returned 404 for user '{other}'"))),
        }
    }
}

/// Holds a running MongoDB container and the Axum router wired to it.
///
/// The container lives as long as this struct; dropping it stops and
/// removes the container.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub router: Router,
    pub users: Arc<dyn UserRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl TestEnv {
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("devconnect_test");
        ensure_indexes(&mongo_db)
            .await
            .expect("Failed to create indexes");

        let users: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(&mongo_db));
        let profiles: Arc<dyn ProfileRepository> =
            Arc::new(MongoProfileRepository::new(&mongo_db));
        let posts: Arc<dyn PostRepository> = Arc::new(MongoPostRepository::new(&mongo_db));

        let app_state = AppState {
            user_repo: users.clone(),
            profile_repo: profiles.clone(),
            post_repo: posts.clone(),
            github: Arc::new(StubGithub),
            tokens: Arc::new(TokenIssuer::new("integration-secret", Duration::hours(1))),
        };

        Self {
            _mongo: mongo_container,
            router: app::router(app_state),
            users,
            profiles,
            posts,
        }
    }

    /// Build an `axum_test::TestServer` that expects 2xx responses.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Helper: register an account and return its session token.
    pub async fn register(
        &self,
        server: &axum_test::TestServer,
        name: &str,
        email: &str,
        password: &str,
    ) -> String {
        let response = server
            .post("/api/users")
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["token"]
            .as_str()
            .expect("token missing from response")
            .to_string()
    }

    /// Helper: the user id behind a session token.
    pub async fn user_id(&self, server: &axum_test::TestServer, token: &str) -> String {
        let me: serde_json::Value = server
            .get("/api/auth")
            .add_header("x-auth-token", token)
            .await
            .json();
        me["_id"].as_str().expect("user id missing").to_string()
    }
}
