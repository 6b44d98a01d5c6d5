use axum::extract::DefaultBodyLimit;
use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use crate::config::settings::SETTINGS;
use crate::handler::emotion_handler::{healthcheck, predict_emotion};
use crate::state::emotion_state::EmotionState;

pub fn new_predict_route() -> Router<EmotionState> {

    let router = Router::new()
        .route("/predict", post(predict_emotion))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(SETTINGS.server.body_limit));
    router
}

pub fn new_health_route() -> Router<EmotionState> {
    Router::new().route("/health", get(healthcheck))
}
