//! API service routes

pub mod engagement;
pub mod users;
pub mod videos;

use auth::auth_middleware;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Create the router for the API service, including the authentication routes
/// and static serving of uploads
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/upload",
            post(videos::upload).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/api/:id/like", post(engagement::like))
        .route("/api/:id/dislike", post(engagement::dislike))
        .route("/api/:id/comment", post(engagement::comment))
        .route("/api/:id/subscribe", post(users::subscribe))
        .route_layer(middleware::from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/videos", get(videos::list_videos))
        .route("/api/search", get(videos::search_videos))
        .route("/api/:id", get(videos::get_video))
        .route("/api/:id/view", post(engagement::view))
        .route("/api/:id/isSubscribed/:uploader_id", get(users::is_subscribed))
        .route("/api/user/:id", get(users::profile))
        .route("/api/user/:id/count", get(videos::user_video_count))
        .route("/api/user/:id/recent", get(videos::recent_user_videos))
        .route("/api/user/:id/videos", get(videos::user_videos))
        .route("/api/users/:id/subscriptions", get(users::subscriptions))
        .merge(protected_routes)
        .with_state(state.clone())
        .merge(auth::create_router(state.auth_state()))
        .nest_service("/uploads", ServeDir::new(state.media.root()))
}

/// The full application: routes plus request tracing and CORS for the web client
pub fn build_app(state: AppState, frontend_url: &str) -> anyhow::Result<Router> {
    Ok(create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(frontend_url)?))
}

/// CORS policy admitting only the web client's origin
pub fn cors_layer(frontend_url: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url.trim_end_matches('/'))?;

    Ok(CorsLayer::new()
        .allow_origin([origin])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "newtube-api"
    }))
}
