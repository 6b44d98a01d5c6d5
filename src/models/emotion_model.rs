use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use crate::pipeline::emotion_pipeline::emotion_pipeline::FaceEmotionResult;
use crate::pipeline::model_config::config::{Emotion, EMOTIONS};

/// JSON body accepted by `POST /predict`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionPredictionRequest {
    pub image: Option<String>,
}

/// Why a prediction request carried no usable image.
#[derive(thiserror::Error, Debug)]
pub enum RequestImageError {
    #[error("request has no image field")]
    Missing,

    #[error("request body is not valid JSON: {0}")]
    NotJson(serde_json::Error),

    #[error("request JSON has the wrong shape, image must be a string: {0}")]
    WrongType(serde_json::Error),
}

impl EmotionPredictionRequest {
    /// Pulls the `image` string out of a raw request body.
    pub fn image_from_slice(payload: &[u8]) -> Result<String, RequestImageError> {
        match serde_json::from_slice::<EmotionPredictionRequest>(payload) {
            Ok(request) => request.image.ok_or(RequestImageError::Missing),
            Err(e) => match e.classify() {
                Category::Data => Err(RequestImageError::WrongType(e)),
                Category::Io | Category::Syntax | Category::Eof => Err(RequestImageError::NotJson(e)),
            },
        }
    }
}

#[derive(Clone)]
pub struct EmotionPredictionInput {
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoundingBoxOutput {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FaceEmotionOutput {
    pub emotion: Emotion,
    pub confidence: f32,
    pub all_emotions: BTreeMap<String, f32>,
    pub bbox: BoundingBoxOutput,
}

impl From<FaceEmotionResult> for FaceEmotionOutput {
    fn from(result: FaceEmotionResult) -> Self {
        let all_emotions = EMOTIONS
            .iter()
            .zip(result.probabilities.iter())
            .map(|(emotion, probability)| (emotion.as_str().to_string(), *probability))
            .collect();

        FaceEmotionOutput {
            emotion: result.emotion,
            confidence: result.confidence,
            all_emotions,
            bbox: BoundingBoxOutput {
                x: result.bbox.x.max(0) as u32,
                y: result.bbox.y.max(0) as u32,
                w: result.bbox.w.max(0) as u32,
                h: result.bbox.h.max(0) as u32,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionPredictionResultOutput {
    pub success: bool,
    pub faces: Vec<FaceEmotionOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthOutput {
    pub status: String,
    pub model_loaded: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;
    use crate::pipeline::module::face_detection::FaceBox;

    #[test]
    fn test_face_output_json() {
        let output = FaceEmotionOutput::from(FaceEmotionResult {
            bbox: FaceBox { x: 3, y: 4, w: 50, h: 60 },
            emotion: Emotion::Sad,
            confidence: 0.5,
            probabilities: vec![0.0, 0.0, 0.25, 0.0, 0.25, 0.5, 0.0],
        });

        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({
                "emotion": "sad",
                "confidence": 0.5,
                "all_emotions": {
                    "angry": 0.0,
                    "disgust": 0.0,
                    "fear": 0.25,
                    "happy": 0.0,
                    "neutral": 0.25,
                    "sad": 0.5,
                    "surprise": 0.0,
                },
                "bbox": {"x": 3, "y": 4, "w": 50, "h": 60},
            })
        );
    }

    #[test]
    fn test_request_without_image() {
        let request: EmotionPredictionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.image.is_none());
    }

    #[test]
    fn test_image_from_slice() {
        let image = EmotionPredictionRequest::image_from_slice(br#"{"image": "data:image/png;base64,AA=="}"#).unwrap();
        assert_eq!(image, "data:image/png;base64,AA==");

        assert!(matches!(
            EmotionPredictionRequest::image_from_slice(b"{}"),
            Err(RequestImageError::Missing)
        ));
        assert!(matches!(
            EmotionPredictionRequest::image_from_slice(br#"{"image": null}"#),
            Err(RequestImageError::Missing)
        ));
    }

    #[test]
    fn test_image_from_slice_tells_bad_json_from_bad_field() {
        let not_json: [&[u8]; 3] = [b"not json", b"", b"{\"image\": "];
        for body in not_json {
            let err = EmotionPredictionRequest::image_from_slice(body).unwrap_err();
            assert!(matches!(err, RequestImageError::NotJson(_)), "{err}");
        }

        let wrong_type: [&[u8]; 3] = [br#"{"image": 5}"#, br#"{"image": ["a"]}"#, b"[1, 2]"];
        for body in wrong_type {
            let err = EmotionPredictionRequest::image_from_slice(body).unwrap_err();
            assert!(matches!(err, RequestImageError::WrongType(_)), "{err}");
            assert!(err.to_string().starts_with("request JSON has the wrong shape"));
        }
    }
}
