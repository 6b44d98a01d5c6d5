use std::fmt;
use serde::Serialize;
use crate::config::settings::{Classifier, Detector, InputLayout};

/// Emotion labels in the order the classifier emits them.
pub const EMOTIONS: [Emotion; 7] = [
    Emotion::Angry,
    Emotion::Disgust,
    Emotion::Fear,
    Emotion::Happy,
    Emotion::Neutral,
    Emotion::Sad,
    Emotion::Surprise,
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry = 0,
    Disgust = 1,
    Fear = 2,
    Happy = 3,
    Neutral = 4,
    Sad = 5,
    Surprise = 6,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn match_emotion(idx: usize) -> Option<Emotion> {
    EMOTIONS.get(idx).copied()
}

#[derive(Debug, Clone)]
pub struct FaceDetectionConfig {
    pub cascade_path: String,
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: (i32, i32),
}

impl FaceDetectionConfig {
    pub fn new(detector: &Detector) -> Self {
        FaceDetectionConfig {
            cascade_path: detector.cascade_path.clone(),
            scale_factor: detector.scale_factor,
            min_neighbors: detector.min_neighbors,
            min_size: (detector.min_size, detector.min_size),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmotionClassificationConfig {
    pub model_path: String,
    pub image_size: (i32, i32),
    pub input_layout: InputLayout,
    pub apply_softmax: bool,
    pub intra_threads: usize,
}

impl EmotionClassificationConfig {
    pub fn new(classifier: &Classifier) -> Self {
        EmotionClassificationConfig {
            model_path: classifier.model_path.clone(),
            image_size: (classifier.input_size, classifier.input_size),
            input_layout: classifier.input_layout,
            apply_softmax: classifier.apply_softmax,
            intra_threads: classifier.intra_threads.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_emotion() {
        assert_eq!(match_emotion(0), Some(Emotion::Angry));
        assert_eq!(match_emotion(4), Some(Emotion::Neutral));
        assert_eq!(match_emotion(6), Some(Emotion::Surprise));
        assert_eq!(match_emotion(7), None);
    }

    #[test]
    fn test_labels_follow_discriminants() {
        for (idx, emotion) in EMOTIONS.iter().enumerate() {
            assert_eq!(*emotion as usize, idx);
        }
        assert_eq!(serde_json::to_string(&Emotion::Surprise).unwrap(), "\"surprise\"");
    }
}
