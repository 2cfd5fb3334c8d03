use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::services::image_store::ImageStore;
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, require_user_auth, trace_id};
use crate::routes::{
    applications, auth, chats, comments, follows, group_messages, groups, health, images,
    rankings, study_records, users,
};
use crate::services::LocalImageStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub image_store: Arc<dyn ImageStore>,
}

/// Builds the router with images stored on the local filesystem.
pub fn create_app(config: Config, pool: PgPool) -> anyhow::Result<Router> {
    let image_store = Arc::new(LocalImageStore::from_config(&config.storage));
    create_app_with_image_store(config, pool, image_store)
}

pub fn create_app_with_image_store(
    config: Config,
    pool: PgPool,
    image_store: Arc<dyn ImageStore>,
) -> anyhow::Result<Router> {
    let jwt = JwtConfig::with_leeway(
        &config.jwt.secret,
        config.jwt.access_token_expiry_secs,
        config.jwt.refresh_token_expiry_secs,
        config.jwt.leeway_secs,
    )?;
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        jwt: Arc::new(jwt),
        image_store,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Routes that require a valid access token
    let protected_routes = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        // Profiles
        .route("/api/v1/users", get(users::list_users))
        .route("/api/v1/users/me", get(users::get_me).put(users::update_me))
        .route("/api/v1/users/:user_id", get(users::get_user))
        // Follow graph
        .route(
            "/api/v1/users/:user_id/follow",
            post(follows::follow).delete(follows::unfollow),
        )
        .route(
            "/api/v1/users/:user_id/follow-status",
            get(follows::follow_status),
        )
        .route(
            "/api/v1/users/:user_id/followers",
            get(follows::list_followers),
        )
        .route(
            "/api/v1/users/:user_id/following",
            get(follows::list_following),
        )
        // Groups
        .route(
            "/api/v1/groups",
            post(groups::create_group).get(groups::list_groups),
        )
        .route(
            "/api/v1/groups/:group_id",
            get(groups::get_group)
                .put(groups::update_group)
                .delete(groups::delete_group),
        )
        .route("/api/v1/groups/:group_id/join", post(groups::join_group))
        .route("/api/v1/groups/:group_id/leave", post(groups::leave_group))
        .route(
            "/api/v1/groups/:group_id/members/:user_id",
            delete(groups::kick_member),
        )
        // Group applications
        .route(
            "/api/v1/groups/:group_id/applications",
            post(applications::apply).get(applications::list_applications),
        )
        .route(
            "/api/v1/groups/:group_id/applications/me",
            get(applications::my_application),
        )
        .route(
            "/api/v1/groups/:group_id/applications/:application_id/approve",
            post(applications::approve_application),
        )
        .route(
            "/api/v1/groups/:group_id/applications/:application_id/reject",
            post(applications::reject_application),
        )
        // Group chat board
        .route(
            "/api/v1/groups/:group_id/messages",
            get(group_messages::list_messages).post(group_messages::post_message),
        )
        // Chat rooms
        .route(
            "/api/v1/chats",
            post(chats::start_chat).get(chats::list_rooms),
        )
        .route("/api/v1/chats/notifications", get(chats::notifications))
        .route("/api/v1/chats/:room_id", get(chats::get_room))
        .route(
            "/api/v1/chats/:room_id/messages",
            get(chats::list_messages).post(chats::send_message),
        )
        .route("/api/v1/chats/:room_id/read", post(chats::mark_read))
        .route("/api/v1/chats/:room_id/participants", post(chats::invite))
        .route(
            "/api/v1/chats/:room_id/participants/:user_id",
            delete(chats::kick),
        )
        .route("/api/v1/chats/:room_id/name", put(chats::rename))
        .route("/api/v1/chats/:room_id/mute", post(chats::toggle_mute))
        .route("/api/v1/chats/:room_id/leave", post(chats::leave))
        // Study certification
        .route(
            "/api/v1/study-records",
            post(study_records::create_record).get(study_records::list_records),
        )
        .route(
            "/api/v1/study-records/:record_id",
            get(study_records::get_record).delete(study_records::delete_record),
        )
        // Rankings
        .route("/api/v1/rankings/users", get(rankings::user_rankings))
        .route("/api/v1/rankings/users/me", get(rankings::my_ranking))
        .route("/api/v1/rankings/groups", get(rankings::group_rankings))
        // Room comments
        .route(
            "/api/v1/rooms/:room_id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route("/images/:key", get(images::serve_image))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
