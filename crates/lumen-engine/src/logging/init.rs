use std::sync::Once;

use log::LevelFilter;

/// Dependencies that are noisy at `info`; capped at `warn` by default.
const NOISY_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Logger setup.
///
/// Filter precedence: `env_filter`, then `RUST_LOG`, then `default_level`
/// with the wgpu modules capped at `warn`. Filters use `env_logger` syntax,
/// e.g. "lumen_engine::frame=debug,wgpu_core=warn".
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Millisecond timestamps on every line.
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            timestamps: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger.
///
/// Only the first call does anything. A logger installed by someone else
/// (a test harness, say) is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
        {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(config.default_level);
                for module in NOISY_MODULES {
                    builder.filter_module(module, LevelFilter::Warn);
                }
            }
        }

        builder.write_style(config.write_style);
        if config.timestamps {
            builder.format_timestamp_millis();
        } else {
            builder.format_timestamp(None);
        }

        if builder.try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let config = LoggingConfig::default().with_filter("lumen_engine=debug");
        assert_eq!(config.env_filter.as_deref(), Some("lumen_engine=debug"));
        init_logging(config.clone());
        init_logging(config);
    }
}
