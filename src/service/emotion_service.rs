use std::sync::Arc;
use log::error;
use crate::error::errors::Error;
use crate::models::emotion_model::{EmotionPredictionInput, EmotionPredictionResultOutput, FaceEmotionOutput};
use crate::pipeline::emotion_pipeline::emotion_pipeline::EmotionPipeline;
use crate::pipeline::utils::data_uri::decode_data_uri;

#[derive(Clone)]
pub struct EmotionService {
    emotion_pipeline: Arc<EmotionPipeline>
}

impl EmotionService {
    pub fn new(emotion_pipeline: &Arc<EmotionPipeline>) -> Self {
        EmotionService {
            emotion_pipeline: Arc::clone(emotion_pipeline),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.emotion_pipeline.model_loaded()
    }

    pub async fn predict_emotions(&self, input: EmotionPredictionInput) -> Result<EmotionPredictionResultOutput, Error> {
        let emotion_pipeline = Arc::clone(&self.emotion_pipeline);

        // decoding and inference are CPU bound
        let result = tokio::task::spawn_blocking(move || {
            let im_bytes = decode_data_uri(&input.image)?;
            drop(input);
            emotion_pipeline.predict(&im_bytes)
        }).await;

        let faces = match result {
            Ok(Ok(faces)) => faces,
            Ok(Err(e)) => {
                error!("failed to predict emotions: {e:#}");
                return Err(Error::server(format!("{e:#}")))
            }
            Err(e) => {
                error!("emotion prediction task failed: {e}");
                return Err(Error::server(e))
            }
        };

        if faces.is_empty() {
            return Err(Error::no_face())
        }

        Ok(EmotionPredictionResultOutput {
            success: true,
            faces: faces.into_iter().map(FaceEmotionOutput::from).collect(),
        })
    }
}
