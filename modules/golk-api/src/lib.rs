pub mod chat;
pub mod rest;
pub mod sessions;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use golk_weather::{WeatherScheduler, WeatherUpdater};

use chat::ChatPipeline;
use rest::weather::WeatherLookup;
use sessions::SessionStore;

/// Weather endpoints are only mounted with a working graph + updater.
pub struct WeatherServices {
    pub lookup: Arc<dyn WeatherLookup>,
    pub updater: Arc<WeatherUpdater>,
    pub scheduler: Arc<WeatherScheduler>,
}

pub struct AppState {
    pub sessions: SessionStore,
    pub pipeline: ChatPipeline,
    pub weather: Option<WeatherServices>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(rest::root))
        .route("/health", get(rest::health))
        // Chat
        .route("/api/start_session", post(rest::start_session))
        .route("/api/chat", post(rest::chat))
        .route("/api/history/{id}", get(rest::history))
        .route("/api/session/{id}", delete(rest::delete_session))
        .route("/chatbot/check_session/{id}", get(rest::check_session))
        .route("/chatbot/chat_history/{id}", get(rest::history))
        // Weather
        .route("/weather/scheduler/status", get(rest::weather::scheduler_status))
        .route("/weather/scheduler/refresh", post(rest::weather::scheduler_refresh))
        .route("/weather/update/month/{month}", post(rest::weather::update_month))
        .route("/weather/{month}", get(rest::weather::weather_by_month))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
