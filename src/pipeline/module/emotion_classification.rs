use anyhow::{Context, Error, Result};
use log::info;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use crate::pipeline::model_config::config::EmotionClassificationConfig;

pub trait EmotionClassifier: Send + Sync {
    /// Scores one preprocessed face, returning one raw score per emotion label.
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, Error>;

    fn is_loaded(&self) -> bool;
}

/// Emotion classifier backed by an ONNX Runtime session.
pub struct OnnxEmotionClassification {
    session: Session,
}

impl OnnxEmotionClassification {
    pub fn new(cfg: &EmotionClassificationConfig) -> Result<Self, Error> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(cfg.intra_threads)?
            .commit_from_file(&cfg.model_path)
            .with_context(|| format!("failed to load emotion model from {}", cfg.model_path))?;

        for input in &session.inputs {
            info!("emotion model input {} {:?}", input.name, input.input_type);
        }

        Ok(OnnxEmotionClassification { session })
    }
}

impl EmotionClassifier for OnnxEmotionClassification {
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, Error> {
        let tensor = Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![tensor]?)?;

        let scores = outputs[0]
            .try_extract_tensor::<f32>()?
            .iter()
            .copied()
            .collect();
        Ok(scores)
    }

    fn is_loaded(&self) -> bool {
        true
    }
}
