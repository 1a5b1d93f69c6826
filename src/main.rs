use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use devconnect::app::{self, AppState};
use devconnect::auth::TokenIssuer;
use devconnect::config::{AppConfig, Cli};
use devconnect::db::indexes::ensure_indexes;
use devconnect::db::post_repository::{MongoPostRepository, PostRepository};
use devconnect::db::profile_repository::{MongoProfileRepository, ProfileRepository};
use devconnect::db::user_repository::{MongoUserRepository, UserRepository};
use devconnect::github::{GithubClient, RepoLookup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devconnect=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    tracing::info!("Starting DevConnect server...");

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let mongo_db = mongo_client.database(&config.mongodb.database);
    ensure_indexes(&mongo_db).await?;

    tracing::info!(database = %config.mongodb.database, "Connected to MongoDB");

    let user_repo: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(&mongo_db));
    let profile_repo: Arc<dyn ProfileRepository> =
        Arc::new(MongoProfileRepository::new(&mongo_db));
    let post_repo: Arc<dyn PostRepository> = Arc::new(MongoPostRepository::new(&mongo_db));
    let github: Arc<dyn RepoLookup> = Arc::new(GithubClient::new(&config.github)?);

    let app_state = AppState {
        user_repo,
        profile_repo,
        post_repo,
        github,
        tokens: Arc::new(TokenIssuer::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl(),
        )),
    };

    let app = app::router(app_state);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
