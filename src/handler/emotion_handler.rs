use axum::debug_handler;
use axum::extract::State;
use bytes::Bytes;
use ecs_logger::extra_fields;
use http::{HeaderMap, StatusCode};
use log::{info, warn};
use opentelemetry::global;
use opentelemetry::KeyValue;
use opentelemetry::trace::{Span, TraceContextExt, Tracer};
use crate::config::settings::SETTINGS;
use crate::error::errors::Error;
use crate::logger::logger::LoggerExtraFields;
use crate::middleware::request_id_mw::REQUEST_ID_HEADER;
use crate::models::emotion_model::{EmotionPredictionInput, EmotionPredictionRequest, EmotionPredictionResultOutput, HealthOutput};
use crate::response::common_response::{GeneralResponseBuilder, GeneralResponseResult};
use crate::state::emotion_state::EmotionState;

#[debug_handler(state=EmotionState)]
pub async fn predict_emotion(headers: HeaderMap, State(state): State<EmotionState>, payload: Bytes) -> GeneralResponseResult<EmotionPredictionResultOutput> {
    let tracer = global::tracer(SETTINGS.app.name.clone());
    let parent_ctx = opentelemetry::Context::new();
    let span = tracer
        .span_builder("emotion-prediction")
        .start_with_context(&tracer, &parent_ctx);

    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if let Err(e) = extra_fields::set_extra_fields(LoggerExtraFields {
        request_id: request_id.clone(),
    }) {
        warn!("failed to set logger extra fields: {e}");
    }

    let child_ctx = parent_ctx.with_span(span);
    let mut child = tracer.start_with_context("decode-request", &child_ctx);
    info!("prediction request received");

    let image = match EmotionPredictionRequest::image_from_slice(&payload) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("rejecting prediction request: {e}");
            None
        }
    };
    child.end();

    let Some(image) = image else {
        child_ctx.span().end();
        extra_fields::clear_extra_fields();
        return Err(Error::missing_image())
    };
    info!("image data size: {} bytes", image.len());
    drop(payload);

    let mut child = tracer.start_with_context("predict-emotions", &child_ctx);
    let result = state
        .emotion_service
        .predict_emotions(EmotionPredictionInput { image })
        .await;

    match &result {
        Ok(output) => {
            child.set_attribute(KeyValue::new("face_count", output.faces.len() as i64));
            info!("successfully processed {} face(s)", output.faces.len());
        }
        Err(e) => {
            child.set_attribute(KeyValue::new("error", e.to_string()));
        }
    }
    child.end();
    child_ctx.span().end();
    extra_fields::clear_extra_fields();

    Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(result?)
        .build()
    )
}

#[debug_handler(state=EmotionState)]
pub async fn healthcheck(State(state): State<EmotionState>) -> GeneralResponseResult<HealthOutput> {
    Ok(GeneralResponseBuilder::new()
        .status_code(StatusCode::OK)
        .body(HealthOutput {
            status: "healthy".to_string(),
            model_loaded: state.emotion_service.model_loaded(),
        })
        .build())
}
