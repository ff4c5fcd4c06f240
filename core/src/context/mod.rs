mod app_config;

pub use app_config::{
    APP_NAME, AppConfig, ConfigError, DEFAULT_DEBRIEFING_DIR, DEFAULT_POLL_INTERVAL_MS,
    default_user_data_root,
};
