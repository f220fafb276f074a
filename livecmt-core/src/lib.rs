pub mod bootstrap;
pub mod config;
pub mod logging;

pub use bootstrap::load_config;
pub use config::{BilibiliConfig, Config, LoggingConfig};
