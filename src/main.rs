mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::admin::routes as admin_routes;
use crate::features::auth;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::services::AuthService;
use crate::features::delete_requests::{
    repositories::PgDeleteRequestRepository, routes as delete_requests_routes,
    DeleteRequestService,
};
use crate::features::moderator_requests::{
    repositories::PgModeratorRequestRepository, routes as moderator_requests_routes,
    ModeratorRequestService,
};
use crate::features::notes::{
    repositories::PgNoteRepository, routes as notes_routes, ModerationService, NoteService,
};
use crate::features::notifications::{
    repositories::PgNotificationRepository, routes as notifications_routes,
    InMemoryNotificationHub, NotificationService,
};
use crate::features::users::{
    repositories::PgUserRepository, routes as users_routes, UserService,
};
use crate::modules::storage::{ObjectStore, S3ObjectStore};
use axum::extract::DefaultBodyLimit;
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize auth
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.google_jwks_url,
        config.auth.jwks_cache_ttl,
    ));
    let google_validator = Arc::new(auth::GoogleTokenValidator::new(
        jwks_client,
        config.auth.google_client_id.clone(),
        config.auth.jwt_leeway,
    ));
    let session_tokens = Arc::new(auth::SessionTokens::new(
        &config.auth.jwt_secret,
        &config.auth.jwt_issuer,
        config.auth.token_ttl,
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    // Initialize object storage for note files
    let s3_store = S3ObjectStore::new(config.storage.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize object storage: {}", e))?;
    // Ensure bucket exists (create if not)
    s3_store
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure storage bucket exists: {}", e))?;
    tracing::info!("Object storage initialized for bucket: {}", s3_store.bucket_name());
    let object_store: Arc<dyn ObjectStore> = Arc::new(s3_store);

    // Repositories
    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let note_repository = Arc::new(PgNoteRepository::new(pool.clone()));
    let notification_repository = Arc::new(PgNotificationRepository::new(pool.clone()));
    let delete_request_repository = Arc::new(PgDeleteRequestRepository::new(pool.clone()));
    let moderator_request_repository = Arc::new(PgModeratorRequestRepository::new(pool.clone()));

    let authenticator = Arc::new(auth::SessionAuthenticator::new(
        Arc::clone(&session_tokens),
        user_repository.clone(),
    ));

    // Initialize Notification Service (persisted + live fan-out)
    let notification_service = Arc::new(NotificationService::new(
        notification_repository,
        Arc::new(InMemoryNotificationHub::new()),
    ));
    tracing::info!("Notification service initialized");

    // Initialize User Service
    let user_service = Arc::new(UserService::new(
        user_repository.clone(),
        note_repository.clone(),
        Arc::clone(&notification_service),
    ));
    tracing::info!("User service initialized");

    // Initialize Note Services
    let moderation_service = Arc::new(ModerationService::new(
        note_repository.clone(),
        Arc::clone(&object_store),
        Arc::clone(&user_service),
        Arc::clone(&notification_service),
        config.moderation.clone(),
    ));
    let note_service = Arc::new(NoteService::new(
        note_repository.clone(),
        Arc::clone(&object_store),
        config.storage.presigned_url_expiry_secs,
    ));
    tracing::info!(
        "Note services initialized (auto-approve: {:?})",
        config.moderation.auto_approve
    );

    // Initialize Request Services
    let delete_request_service = Arc::new(DeleteRequestService::new(
        delete_request_repository,
        note_repository,
        Arc::clone(&moderation_service),
        Arc::clone(&notification_service),
    ));
    let moderator_request_service = Arc::new(ModeratorRequestService::new(
        moderator_request_repository,
        Arc::clone(&user_service),
        Arc::clone(&notification_service),
    ));
    tracing::info!("Request services initialized");

    // Initialize Auth Service (Google sign-in)
    let auth_service = Arc::new(AuthService::new(
        google_validator,
        Arc::clone(&session_tokens),
        user_repository,
        config.auth.admin_emails.clone(),
    ));
    tracing::info!("Auth service initialized");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require a session token)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&auth_service)))
        .merge(users_routes::routes(Arc::clone(&user_service)))
        .merge(notes_routes::protected_routes(
            Arc::clone(&note_service),
            Arc::clone(&moderation_service),
        ))
        .merge(delete_requests_routes::routes(delete_request_service))
        .merge(moderator_requests_routes::routes(moderator_request_service))
        .merge(notifications_routes::routes(notification_service))
        .merge(admin_routes::routes(Arc::clone(&moderation_service)))
        .route_layer(axum::middleware::from_fn_with_state(
            Arc::clone(&authenticator),
            middleware::auth_middleware,
        ));

    // Browsing and guest uploads; a token, when sent, must be valid
    let optional_auth_routes = notes_routes::public_routes(
        note_service,
        moderation_service,
        config.moderation.max_upload_size,
    )
    .route_layer(axum::middleware::from_fn_with_state(
        authenticator,
        middleware::optional_auth_middleware,
    ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new().merge(auth_routes::public_routes(auth_service));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(optional_auth_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
