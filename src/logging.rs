use crate::engine::EngineBuild;
use tracing::Level;

/// Process wide settings applied once at startup, before any environment is created.
#[derive(Debug, Clone, Copy)]
pub struct StartupConfig {
    pub log_level: Level,
    /// Launch the DebugGame editor binary instead of the Development one.
    pub debug: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            debug: false,
        }
    }
}

impl StartupConfig {
    pub fn build(&self) -> EngineBuild {
        EngineBuild::from_debug(self.debug)
    }
}

/// Installs the fmt subscriber. Later calls leave the first subscriber in place.
pub fn init(config: &StartupConfig) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(false)
        .try_init();
}
