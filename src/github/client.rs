use std::time::Duration;

use async_trait::async_trait;

use crate::config::GithubConfig;
use crate::error::AppError;

/// Read-only lookup of a user's public repositories on a code host.
///
/// Abstracted as a trait so tests can use a mock without network access.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoLookup: Send + Sync {
    /// The upstream response body, passed through untouched.
    async fn public_repos(&self, username: &str) -> Result<serde_json::Value, AppError>;
}

/// GitHub REST implementation of RepoLookup.
pub struct GithubClient {
    http: reqwest::Client,
    api_url: url::Url,
    token: Option<String>,
    per_page: u8,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, AppError> {
        let api_url = url::Url::parse(&config.api_url)
            .map_err(|e| AppError::Internal(format!("Invalid github.api_url: {e}")))?;

        Self::build(
            api_url,
            config.token.clone(),
            &config.user_agent,
            config.timeout(),
            config.per_page,
        )
    }

    fn build(
        api_url: url::Url,
        token: Option<String>,
        user_agent: &str,
        timeout: Duration,
        per_page: u8,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url,
            token: token.filter(|t| !t.is_empty()),
            per_page,
        })
    }

    /// `{api}/users/{username}/repos?per_page=N&sort=created&direction=asc`
    pub fn repos_url(&self, username: &str) -> Result<url::Url, AppError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("github.api_url cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(["users", username, "repos"]);
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("sort", "created")
            .append_pair("direction", "asc");
        Ok(url)
    }
}

#[async_trait]
impl RepoLookup for GithubClient {
    async fn public_repos(&self, username: &str) -> Result<serde_json::Value, AppError> {
        let url = self.repos_url(username)?;

        let mut request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("GitHub request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "GitHub returned {status} for user '{username}'"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid GitHub response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, Query};
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::Router;

    #[derive(Default, Debug)]
    struct Seen {
        username: Option<String>,
        query: HashMap<String, String>,
        authorization: Option<String>,
        user_agent: Option<String>,
    }

    /// Serve a fake `/users/{name}/repos` endpoint on an ephemeral port.
    async fn fake_github(status: u16, delay: Duration) -> (url::Url, Arc<Mutex<Seen>>) {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let recorder = seen.clone();

        let app = Router::new().route(
            "/users/{name}/repos",
            get(
                move |Path(name): Path<String>,
                      Query(query): Query<HashMap<String, String>>,
                      headers: HeaderMap| {
                    let recorder = recorder.clone();
                    async move {
                        {
                            let mut seen = recorder.lock().unwrap();
                            seen.username = Some(name);
                            seen.query = query;
                            seen.authorization = headers
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            seen.user_agent = headers
                                .get("user-agent")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                        }
                        tokio::time::sleep(delay).await;
                        (
                            axum::http::StatusCode::from_u16(status).unwrap(),
                            axum::Json(serde_json::json!([{ "name": "hello-world" }])),
                        )
                    }
                },
            ),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (url::Url::parse(&format!("http://{addr}")).unwrap(), seen)
    }

    fn client(api_url: url::Url, token: Option<&str>, timeout: Duration) -> GithubClient {
        GithubClient::build(api_url, token.map(str::to_string), "devconnect-test", timeout, 5)
            .unwrap()
    }

    #[test]
    fn test_repos_url() {
        let client = client(
            url::Url::parse("https://api.github.com").unwrap(),
            None,
            Duration::from_secs(1),
        );
        let url = client.repos_url("octocat").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/users/octocat/repos?per_page=5&sort=created&direction=asc"
        );
    }

    #[test]
    fn test_repos_url_escapes_username() {
        let client = client(
            url::Url::parse("https://api.github.com/").unwrap(),
            None,
            Duration::from_secs(1),
        );
        let url = client.repos_url("a/b").unwrap();
        assert!(url.path().starts_with("/users/a%2Fb/repos"));
    }

    #[tokio::test]
    async fn test_public_repos_passes_body_through() {
        let (api_url, seen) = fake_github(200, Duration::ZERO).await;
        let client = client(api_url, Some("gh-token"), Duration::from_secs(5));

        let body = client.public_repos("octocat").await.unwrap();
        assert_eq!(body[0]["name"], "hello-world");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.username.as_deref(), Some("octocat"));
        assert_eq!(seen.query.get("per_page").map(String::as_str), Some("5"));
        assert_eq!(seen.query.get("sort").map(String::as_str), Some("created"));
        assert_eq!(seen.query.get("direction").map(String::as_str), Some("asc"));
        assert_eq!(seen.authorization.as_deref(), Some("Bearer gh-token"));
        assert_eq!(seen.user_agent.as_deref(), Some("devconnect-test"));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let (api_url, _) = fake_github(404, Duration::ZERO).await;
        let client = client(api_url, None, Duration::from_secs(5));

        match client.public_repos("ghost").await {
            Err(AppError::Upstream(msg)) => assert!(msg.contains("404")),
            other => panic!("Expected Upstream error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_timeout() {
        let (api_url, _) = fake_github(200, Duration::from_secs(2)).await;
        let client = client(api_url, None, Duration::from_millis(100));

        assert!(matches!(
            client.public_repos("slow").await,
            Err(AppError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn test_no_token_sends_no_authorization() {
        let (api_url, seen) = fake_github(200, Duration::ZERO).await;
        let client = client(api_url, Some(""), Duration::from_secs(5));

        client.public_repos("octocat").await.unwrap();
        assert!(seen.lock().unwrap().authorization.is_none());
    }
}
