//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 环境变量前缀，`RULE_CONSOLE__API__BASE_URL` -> `api.base_url`
const ENV_PREFIX: &str = "RULE_CONSOLE";
const ENV_SEPARATOR: &str = "__";

/// 远程规则服务 API 配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// 规则服务根地址，不含末尾斜杠
    pub base_url: String,
    /// 单次请求总超时
    pub timeout_seconds: u64,
    /// 建立连接超时
    pub connect_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// 规则同步配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// 同一规则已有变更请求在途时，拒绝第二个变更请求（返回 Busy）
    ///
    /// 默认关闭：并发请求按"最后到达的响应生效"处理。
    pub guard_concurrent_mutations: bool,
}

/// 调用方重试配置（仅用于启动时加载规则列表）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub retry: RetryConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. .env 文件（如存在，注入进程环境变量）
    /// 2. config/default.toml（默认配置）
    /// 3. config/{environment}.toml（环境特定配置）
    /// 4. config/{service_name}.toml（服务特定配置）
    /// 5. 环境变量（RULE_CONSOLE__ 前缀，如 RULE_CONSOLE__API__BASE_URL -> api.base_url）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        Self::load_with_dir(service_name, None)
    }

    /// 同 `load`，但可显式指定配置目录（优先于 CONFIG_DIR）
    pub fn load_with_dir(service_name: &str, config_dir: Option<&Path>) -> Result<Self, ConfigError> {
        // .env 不存在属于正常情况
        let _ = dotenvy::dotenv();

        let env = std::env::var("RULE_CONSOLE_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = match config_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::var("CONFIG_DIR")
                .unwrap_or_else(|_| "config".to_string())
                .into(),
        };

        Self::load_from(&config_dir, service_name, &env)
    }

    /// 从指定配置目录加载，供 `load` 和测试复用
    pub fn load_from(
        config_dir: &Path,
        service_name: &str,
        environment: &str,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", environment)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", environment))).required(false),
            )
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
