use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use axum::http::header;
use axum::response::Html;
use axum::routing::get;
use http::{Method, Uri};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use crate::config::settings::SETTINGS;
use crate::error::errors::Error;
use crate::middleware::error_body_mw::json_error_body_mw;
use crate::middleware::request_id_mw::{generate_request_id_mw, REQUEST_ID_HEADER};
use crate::pipeline::emotion_pipeline::emotion_pipeline::EmotionPipeline;
use crate::routes::predict_route::{new_health_route, new_predict_route};
use crate::state::emotion_state::EmotionState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Clone)]
pub struct RouterState {
    emotion_pipeline: Arc<EmotionPipeline>,
}

impl RouterState {
    pub fn new(emotion_pipeline: EmotionPipeline) -> Self {
        RouterState {
            emotion_pipeline: Arc::new(emotion_pipeline),
        }
    }
}

pub fn root_routes(router_state: RouterState) -> Router {

    let emotion_router = {
        let emotion_state = EmotionState::new(&router_state.emotion_pipeline);

        Router::new()
            .merge(new_health_route())
            .merge(new_predict_route())
            .with_state(emotion_state)
    };

    let request_timeout_duration = SETTINGS.server.request_timeout.unwrap_or(20);

    Router::new()
        .route("/", get(index))
        .merge(emotion_router)
        .nest_service("/static", ServeDir::new(&SETTINGS.server.static_dir))
        .fallback(fallback)
        .layer(CompressionLayer::new())
        .layer(PropagateHeaderLayer::new(header::HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(CorsLayer::permissive().allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS]))
        .layer(middleware::from_fn(generate_request_id_mw))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_duration)))
        .layer(middleware::map_response(json_error_body_mw))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn fallback(uri: Uri) -> Error {
    Error::NotFound(format!("No route for {uri}"))
}
