//! tutorhub server entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tutorhub_api::{AppState, middleware::auth_middleware, router as api_router};
use tutorhub_common::{Config, LocalStorage};
use tutorhub_core::{
    AuthService, CommentService, EnrollmentService, LikeService, ProfileService,
    ThumbnailService, TutorialService,
};
use tutorhub_db::repositories::{
    CommentRepository, EnrollmentRepository, IdentityRepository, LikeRepository,
    ProfileRepository, TutorialRepository,
};

/// Room for multipart framing and the JSON part on top of the thumbnail itself.
const MULTIPART_OVERHEAD: u64 = 256 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tutorhub=debug,tower_http=debug".into());
    let json = std::env::var("TUTORHUB_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wire repositories and services over one connection pool.
fn build_state(db: DatabaseConnection, config: &Config) -> AppState {
    let db = Arc::new(db);

    let identity_repo = IdentityRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let tutorial_repo = TutorialRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let enrollment_repo = EnrollmentRepository::new(db);

    let storage = LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    );
    let thumbnail_service =
        ThumbnailService::new(Arc::new(storage), config.storage.max_upload_bytes);

    let comment_service = CommentService::new(comment_repo, profile_repo.clone());
    let like_service = LikeService::new(
        like_repo.clone(),
        tutorial_repo.clone(),
        profile_repo.clone(),
    );
    let enrollment_service = EnrollmentService::new(
        enrollment_repo.clone(),
        tutorial_repo.clone(),
        profile_repo.clone(),
    );
    let tutorial_service = TutorialService::new(
        tutorial_repo,
        profile_repo.clone(),
        like_repo,
        enrollment_repo,
        comment_service.clone(),
        like_service.clone(),
        enrollment_service.clone(),
        thumbnail_service.clone(),
    );

    AppState {
        auth_service: AuthService::new(identity_repo, profile_repo.clone()),
        profile_service: ProfileService::new(profile_repo),
        tutorial_service,
        like_service,
        comment_service,
        enrollment_service,
        thumbnail_service,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting tutorhub server...");

    let config = Config::load().context("failed to load configuration")?;

    let db = tutorhub_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    tutorhub_db::migrate(&db).await?;
    info!("Migrations completed");

    tokio::fs::create_dir_all(&config.storage.base_path)
        .await
        .with_context(|| format!("failed to create {}", config.storage.base_path.display()))?;

    let state = build_state(db, &config);
    let body_limit = usize::try_from(config.storage.max_upload_bytes + MULTIPART_OVERHEAD)
        .context("storage.max_upload_bytes is too large")?;

    let mut app = Router::new().nest("/api", api_router());

    // Objects are public; serve them ourselves unless they live elsewhere
    let files_prefix = config.storage.base_url.trim_end_matches('/');
    if files_prefix.starts_with('/') && files_prefix.len() > 1 {
        let dir: PathBuf = config.storage.base_path.clone();
        app = app.nest_service(files_prefix, ServeDir::new(dir));
        info!(prefix = %files_prefix, "Serving uploaded files");
    }

    let app = app
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {} ({})", addr, config.server.url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
