mod routes;
mod logger;
mod config;
mod response;
mod error;
mod models;
mod middleware;
mod state;
mod handler;
mod service;
mod pipeline;

mod tracer;

use log::{info, warn};
use opentelemetry::global;
use opentelemetry::global::shutdown_tracer_provider;
use tokio::signal;
use crate::logger::logger::setup_logger;
use crate::config::settings::SETTINGS;
use crate::pipeline::emotion_pipeline::emotion_pipeline::EmotionPipeline;
use crate::pipeline::model_config::config::EMOTIONS;
use crate::routes::root::{root_routes, RouterState};


#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
use crate::tracer::tracer::init_tracer_provider;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() {
    // Setup environment and logger
    crate::config::parameter::init();
    setup_logger();
    let addr = format!("0.0.0.0:{}", SETTINGS.server.http_port);
    info!("starting facial expression recognition server");

    // Setup pipeline
    let emotion_pipeline = EmotionPipeline::new(&SETTINGS)
        .unwrap_or_else(|e| panic!("Failed to init emotion pipeline: {e:#}"));

    let warmup_scores = emotion_pipeline
        .warmup()
        .unwrap_or_else(|e| panic!("Emotion model self-check failed: {e:#}"));
    info!("model loaded: {}, blank input scores {:?}", SETTINGS.classifier.model_path, warmup_scores);

    let labels: Vec<&str> = EMOTIONS.iter().map(|emotion| emotion.as_str()).collect();
    info!("emotions: {}", labels.join(", "));

    // Setup tracing
    let tracing_enabled = match &SETTINGS.tracer {
        Some(tracer) => {
            let tracer_provider = init_tracer_provider(&tracer.uri).expect("Failed to initialize tracer provider.");
            global::set_tracer_provider(tracer_provider);
            true
        }
        None => {
            warn!("no tracer configured, span export disabled");
            false
        }
    };

    // Init server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to create new listener: {}", e.to_string()));
    info!("server ready on {:?} ({})", addr, SETTINGS.server);
    let router_state = RouterState::new(emotion_pipeline);

    axum::serve(listener, root_routes(router_state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| panic!("Failed to start api server: {}", e.to_string()));

    if tracing_enabled {
        shutdown_tracer_provider();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
