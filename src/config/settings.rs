use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{env, fmt};

pub static SETTINGS: Lazy<Settings> = Lazy::new(|| Settings::new().expect("Failed to setup settings"));

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub http_port: u16,
    pub request_timeout: Option<u64>,
    pub body_limit: usize,
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tracer {
    pub uri: String,
}

/// Haar cascade parameters, passed straight to `detectMultiScale`.
#[derive(Debug, Clone, Deserialize)]
pub struct Detector {
    pub cascade_path: String,
    pub scale_factor: f64,
    pub min_neighbors: i32,
    pub min_size: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputLayout {
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Classifier {
    pub model_path: String,
    pub input_size: i32,
    pub input_layout: InputLayout,
    pub apply_softmax: bool,
    pub intra_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Option<Logger>,
    pub tracer: Option<Tracer>,
    pub detector: Detector,
    pub classifier: Classifier,
    pub app: App,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("app.name", "emotion-recognition-svc")?
            .set_default("server.http_port", 5000)?
            .set_default("server.request_timeout", 20)?
            .set_default("server.body_limit", 20 * 1024 * 1024)?
            .set_default("server.static_dir", "static")?
            .set_default("detector.cascade_path", "models/haarcascade_frontalface_default.xml")?
            .set_default("detector.scale_factor", 1.1)?
            .set_default("detector.min_neighbors", 5)?
            .set_default("detector.min_size", 30)?
            .set_default("classifier.model_path", "trained_models/emotion_model_best.onnx")?
            .set_default("classifier.input_size", 48)?
            .set_default("classifier.input_layout", "nhwc")?
            .set_default("classifier.apply_softmax", false)?
            .set_default("classifier.intra_threads", 1)?
            .add_source(File::with_name("conf/config.toml").format(FileFormat::Toml).required(false))
            .add_source(File::with_name(&format!("conf/{run_mode}")).required(false))
            .add_source(File::with_name("conf/local").required(false))
            .add_source(Environment::default().separator("__"));

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.http_port", port)?;
        }
        if let Ok(model_path) = env::var("MODEL_PATH") {
            builder = builder.set_override("classifier.model_path", model_path)?;
        }
        if let Ok(cascade_path) = env::var("CASCADE_PATH") {
            builder = builder.set_override("detector.cascade_path", cascade_path)?;
        }

        builder.build()?.try_deserialize()
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "http://localhost:{}", &self.http_port)
    }
}
