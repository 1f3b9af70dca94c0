pub mod config;
pub mod orchestrator;
pub mod resources;
pub mod system;

use crate::config::settings::Settings;
use ::config::ConfigError;
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

// Singleton settings for all application, loaded once at startup
pub fn init_settings() -> Result<&'static Settings, ConfigError> {
    if let Some(settings) = SETTINGS.get() {
        return Ok(settings);
    }
    let loaded = Settings::new()?;
    Ok(SETTINGS.get_or_init(|| loaded))
}
