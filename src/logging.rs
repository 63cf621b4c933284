//! Logging setup / 日志初始化
//!
//! `RUST_LOG` wins when set; otherwise the level comes from the config file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogLevel, LoggingConfig};

/// Default directive for a configured level / 按配置级别生成默认过滤指令
///
/// Third-party crates stay at `warn` unless the level is stricter.
pub fn default_directive(level: LogLevel) -> String {
    match level {
        LogLevel::Error => "error".to_string(),
        _ => format!("warn,paperweight={}", level.as_filter()),
    }
}

/// Install the global subscriber / 安装全局日志订阅器
///
/// Logs always go to stderr. When `file` is set a second, non-ANSI layer
/// appends to it.
pub fn init_logging(config: &LoggingConfig) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.level)));

    let file_layer = match config.file.as_deref() {
        Some(path) if !path.trim().is_empty() => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(LogLevel::Debug), "warn,paperweight=debug");
        assert_eq!(default_directive(LogLevel::Info), "warn,paperweight=info");
        assert_eq!(default_directive(LogLevel::Warning), "warn,paperweight=warn");
        assert_eq!(default_directive(LogLevel::Error), "error");
    }

    #[test]
    fn test_directive_parses() {
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warning, LogLevel::Error] {
            assert!(EnvFilter::try_new(default_directive(level)).is_ok());
        }
    }
}
