//! Jump-Height Analysis Channel
//!
//! Typed request boundary for the on-device jump-height model:
//! - `analyzeFrame`: one frame in, one jump height out
//! - `analyzeVideo`: ordered frames in, per-frame heights plus max/mean out
//!
//! Also owns the process-level ambient setup: configuration and logging.

mod config;
mod error;
mod plugin;
mod request;

pub use config::{LogFormat, LoggingConfig, ModelConfig, PluginConfig};
pub use error::{ChannelError, ErrorCode};
pub use plugin::{JumpHeightPlugin, ANALYZE_FRAME, ANALYZE_VIDEO};
pub use request::{AnalyzeFrameRequest, AnalyzeVideoRequest, VideoAnalysis};

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging; returns `false` if a subscriber was already installed
pub fn init_logging(config: &LoggingConfig) -> bool {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish()),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        let config = LoggingConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
