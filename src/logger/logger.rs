use serde::Serialize;
use crate::config::settings::{Logger, SETTINGS};

/// ECS extra fields attached to every log line of a request.
#[derive(Serialize)]
pub struct LoggerExtraFields {
    pub request_id: String,
}

fn level_filter(level: &str) -> log::LevelFilter {
    match level {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

pub fn setup_logger() {
    let setting_level = &SETTINGS.logger.clone().unwrap_or(Logger { level: "info".to_string()}).level;

    let _ = env_logger::builder()
        .filter_level(level_filter(setting_level.as_str()))
        .format_timestamp_micros()
        .format(ecs_logger::format)
        .target(env_logger::Target::Stdout)
        .try_init();
}


#[cfg(test)]
mod tests {
    use log::info;
    use super::*;

    #[test]
    fn test_logger() {
        setup_logger();
        info!("test log info");
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter("debug"), log::LevelFilter::Debug);
        assert_eq!(level_filter("off"), log::LevelFilter::Off);
        assert_eq!(level_filter("verbose"), log::LevelFilter::Info);
    }
}
