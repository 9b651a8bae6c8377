//! 日志初始化
//!
//! 基于 tracing-subscriber 组合环境过滤器与格式化层，
//! 支持人类可读（pretty）与 JSON 两种输出格式。

use anyhow::Result;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 构建环境过滤器
///
/// `RUST_LOG` 优先，其次使用配置中的日志级别，两者都无效时回退到 info。
pub fn build_env_filter(config: &ObservabilityConfig) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    resolve_filter(from_env.as_deref(), &config.log_level)
}

fn resolve_filter(from_env: Option<&str>, log_level: &str) -> EnvFilter {
    from_env
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(log_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// 初始化全局日志订阅者
///
/// 同一进程只能初始化一次，重复调用返回错误。
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = build_env_filter(config);

    let fmt_layer = if config.json_logs() {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back_to_info() {
        let filter = resolve_filter(None, "rule_client=loud");
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_configured_level_used_without_rust_log() {
        let filter = resolve_filter(None, "rule_client=debug");
        assert_eq!(filter.to_string(), "rule_client=debug");

        let filter = resolve_filter(Some("  "), "warn");
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_rust_log_wins_over_config() {
        let filter = resolve_filter(Some("error"), "debug");
        assert_eq!(filter.to_string(), "error");

        // RUST_LOG 无法解析时退回配置
        let filter = resolve_filter(Some("rule_client=loud"), "debug");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_second_init_fails() {
        let config = ObservabilityConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
