pub mod emotion_model;
