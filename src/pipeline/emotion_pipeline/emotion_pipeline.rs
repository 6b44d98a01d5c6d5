use anyhow::{Context, Error, Result};
use log::{debug, info};
use ndarray::Array4;
use opencv::core::Mat;
use opencv::imgproc::{cvt_color_def, COLOR_BGR2GRAY};
use opencv::prelude::*;
use crate::config::settings::{InputLayout, Settings};
use crate::pipeline::model_config::config::{Emotion, EmotionClassificationConfig, FaceDetectionConfig, EMOTIONS, match_emotion};
use crate::pipeline::module::emotion_classification::{EmotionClassifier, OnnxEmotionClassification};
use crate::pipeline::module::face_detection::{FaceBox, FaceLocator, HaarCascadeDetection};
use crate::pipeline::processing::preprocess::prepare_face;
use crate::pipeline::utils::utils::{argmax, byte_data_to_opencv, softmax};

pub struct EmotionPipeline {
    face_detection: Box<dyn FaceLocator>,
    emotion_classification: Box<dyn EmotionClassifier>,
    image_size: (i32, i32),
    input_layout: InputLayout,
    apply_softmax: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceEmotionResult {
    pub bbox: FaceBox,
    pub emotion: Emotion,
    pub confidence: f32,
    /// One probability per entry of `EMOTIONS`, in the same order.
    pub probabilities: Vec<f32>,
}

impl EmotionPipeline {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let face_detection_cfg = FaceDetectionConfig::new(&settings.detector);
        let emotion_classification_cfg = EmotionClassificationConfig::new(&settings.classifier);

        let face_detection = match HaarCascadeDetection::new(&face_detection_cfg) {
            Ok(face_detection) => face_detection,
            Err(e) => {
                return Err(e)
            }
        };
        info!("loaded face cascade from {}", face_detection_cfg.cascade_path);

        let emotion_classification = match OnnxEmotionClassification::new(&emotion_classification_cfg) {
            Ok(emotion_classification) => emotion_classification,
            Err(e) => {
                return Err(e)
            }
        };
        info!("loaded emotion model from {}", emotion_classification_cfg.model_path);

        Ok(EmotionPipeline::with_components(
            Box::new(face_detection),
            Box::new(emotion_classification),
            &emotion_classification_cfg,
        ))
    }

    pub fn with_components(
        face_detection: Box<dyn FaceLocator>,
        emotion_classification: Box<dyn EmotionClassifier>,
        cfg: &EmotionClassificationConfig,
    ) -> Self {
        EmotionPipeline {
            face_detection,
            emotion_classification,
            image_size: cfg.image_size,
            input_layout: cfg.input_layout,
            apply_softmax: cfg.apply_softmax,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.emotion_classification.is_loaded()
    }

    /// Runs the classifier once on a blank input and checks the output width.
    pub fn warmup(&self) -> Result<Vec<f32>, Error> {
        let (width, height) = (self.image_size.0 as usize, self.image_size.1 as usize);
        let input = match self.input_layout {
            InputLayout::Nhwc => Array4::<f32>::zeros((1, height, width, 1)),
            InputLayout::Nchw => Array4::<f32>::zeros((1, 1, height, width)),
        };

        let scores = self.emotion_classification.classify(input).context("warmup inference failed")?;
        self.probabilities(scores)
    }

    /// Detects every face in an encoded image and classifies each one.
    /// An image without faces yields an empty vector.
    pub fn predict(&self, im_bytes: &[u8]) -> Result<Vec<FaceEmotionResult>, Error> {
        let image = byte_data_to_opencv(im_bytes)?;
        debug!("decoded image {}x{}", image.cols(), image.rows());

        let mut gray = Mat::default();
        cvt_color_def(&image, &mut gray, COLOR_BGR2GRAY)?;
        drop(image);

        let faces = match self.face_detection.locate(&gray) {
            Ok(faces) => faces,
            Err(e) => {
                return Err(e.context("face detection failed"))
            }
        };
        let face_count = faces.len();
        info!("found {face_count} face(s)");

        let mut results = Vec::with_capacity(face_count);
        for (idx, face) in faces.into_iter().enumerate() {
            let result = self.classify_face(&gray, face)?;
            debug!("face {}/{}: {} ({:.2})", idx + 1, face_count, result.emotion, result.confidence);
            results.push(result);
        }

        Ok(results)
    }

    fn classify_face(&self, gray: &Mat, face: FaceBox) -> Result<FaceEmotionResult, Error> {
        let input = prepare_face(gray, &face, self.image_size, self.input_layout)?;

        let scores = match self.emotion_classification.classify(input) {
            Ok(scores) => scores,
            Err(e) => {
                return Err(e.context("emotion inference failed"))
            }
        };
        let probabilities = self.probabilities(scores)?;

        let (idx, confidence) = argmax(&probabilities)
            .ok_or_else(|| Error::msg("emotion model returned no usable scores"))?;
        let emotion = match_emotion(idx)
            .ok_or_else(|| Error::msg(format!("emotion index {idx} out of range")))?;

        Ok(FaceEmotionResult {
            bbox: face,
            emotion,
            confidence,
            probabilities,
        })
    }

    /// Checks the output width and turns logits into probabilities when configured to.
    fn probabilities(&self, scores: Vec<f32>) -> Result<Vec<f32>, Error> {
        if scores.len() != EMOTIONS.len() {
            return Err(Error::msg(format!(
                "emotion model returned {} scores, expected {}",
                scores.len(),
                EMOTIONS.len()
            )))
        }

        if self.apply_softmax {
            return Ok(softmax(&scores))
        }
        Ok(scores)
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use opencv::core::Rect;
    use super::*;
    use super::fakes::{FailingClassifier, FixedFaces, FixedScores};
    use crate::pipeline::utils::utils::test_images::bgr_png;

    const HAPPY: [f32; 7] = [0.05, 0.01, 0.04, 0.7, 0.1, 0.05, 0.05];

    fn cfg(layout: InputLayout) -> EmotionClassificationConfig {
        EmotionClassificationConfig {
            model_path: String::new(),
            image_size: (48, 48),
            input_layout: layout,
            apply_softmax: false,
            intra_threads: 1,
        }
    }

    fn logits_cfg() -> EmotionClassificationConfig {
        EmotionClassificationConfig {
            apply_softmax: true,
            ..cfg(InputLayout::Nhwc)
        }
    }

    struct SharedScores(Arc<FixedScores>);

    impl EmotionClassifier for SharedScores {
        fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>, Error> {
            self.0.classify(input)
        }

        fn is_loaded(&self) -> bool {
            self.0.is_loaded()
        }
    }

    #[test]
    fn test_predict_every_face() {
        let scores = Arc::new(FixedScores::new(HAPPY.to_vec()));
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![Rect::new(5, 5, 40, 40), Rect::new(50, 10, 60, 60)])),
            Box::new(SharedScores(scores.clone())),
            &cfg(InputLayout::Nhwc),
        );

        let results = pipeline.predict(&bgr_png(80, 100)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].bbox, FaceBox { x: 5, y: 5, w: 40, h: 40 });
        // second box overhangs the bottom edge and gets clamped
        assert_eq!(results[1].bbox, FaceBox { x: 50, y: 10, w: 50, h: 60 });

        for result in &results {
            assert_eq!(result.emotion, Emotion::Happy);
            assert!((result.confidence - 0.7).abs() < 1e-6);
            let sum: f32 = result.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
            assert!(result.bbox.x + result.bbox.w <= 100);
            assert!(result.bbox.y + result.bbox.h <= 80);
        }

        let shapes = scores.seen_shapes.lock().unwrap();
        assert_eq!(*shapes, vec![vec![1, 48, 48, 1], vec![1, 48, 48, 1]]);
    }

    #[test]
    fn test_predict_without_faces() {
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![])),
            Box::new(FixedScores::new(HAPPY.to_vec())),
            &cfg(InputLayout::Nhwc),
        );

        assert!(pipeline.predict(&bgr_png(30, 30)).unwrap().is_empty());
    }

    #[test]
    fn test_predict_fails_whole_request() {
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![Rect::new(0, 0, 20, 20)])),
            Box::new(FailingClassifier),
            &cfg(InputLayout::Nhwc),
        );

        let err = pipeline.predict(&bgr_png(30, 30)).unwrap_err();
        assert_eq!(err.to_string(), "emotion inference failed");
        assert_eq!(err.root_cause().to_string(), "session run failed");
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![Rect::new(0, 0, 20, 20)])),
            Box::new(FixedScores::new(vec![0.5, 0.5])),
            &cfg(InputLayout::Nhwc),
        );

        assert!(pipeline.predict(&bgr_png(30, 30)).is_err());
    }

    #[test]
    fn test_predict_undecodable() {
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![])),
            Box::new(FixedScores::new(HAPPY.to_vec())),
            &cfg(InputLayout::Nhwc),
        );

        assert!(pipeline.predict(b"not an image").is_err());
    }

    #[test]
    fn test_warmup_layouts() {
        let scores = Arc::new(FixedScores::new(HAPPY.to_vec()));
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![])),
            Box::new(SharedScores(scores.clone())),
            &cfg(InputLayout::Nchw),
        );

        assert_eq!(pipeline.warmup().unwrap(), HAPPY.to_vec());
        assert_eq!(*scores.seen_shapes.lock().unwrap(), vec![vec![1, 1, 48, 48]]);
        assert!(pipeline.model_loaded());
    }

    #[test]
    fn test_warmup_rejects_wrong_width() {
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![])),
            Box::new(FixedScores::new(vec![0.5, 0.5])),
            &cfg(InputLayout::Nhwc),
        );

        let err = pipeline.warmup().unwrap_err();
        assert_eq!(err.to_string(), "emotion model returned 2 scores, expected 7");
    }

    #[test]
    fn test_predict_applies_softmax_to_logits() {
        let logits = vec![-1.0, 0.5, 0.0, 3.0, 1.0, -2.0, 0.2];
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![Rect::new(0, 0, 30, 30)])),
            Box::new(FixedScores::new(logits)),
            &logits_cfg(),
        );

        let results = pipeline.predict(&bgr_png(40, 40)).unwrap();
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.emotion, Emotion::Happy);

        let sum: f32 = result.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(result.probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!((result.confidence - result.probabilities[3]).abs() < 1e-6);
    }

    #[test]
    fn test_warmup_applies_softmax() {
        let pipeline = EmotionPipeline::with_components(
            Box::new(FixedFaces(vec![])),
            Box::new(FixedScores::new(vec![0.0; 7])),
            &logits_cfg(),
        );

        let probabilities = pipeline.warmup().unwrap();
        for p in probabilities {
            assert!((p - 1.0 / 7.0).abs() < 1e-6);
        }
    }
}
