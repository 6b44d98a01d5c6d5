pub mod emotion_classification;
pub mod face_detection;
