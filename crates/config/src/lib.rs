//! warden-config - 配置加载库

use std::net::SocketAddr;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

/// 环境变量前缀，嵌套字段用 `__` 分隔，例如 `WARDEN_SESSION__MAX_BATCH`
pub const ENV_PREFIX: &str = "WARDEN_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Secret<String>,
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
    /// Prometheus 指标监听地址，未配置时不导出
    pub metrics_addr: Option<SocketAddr>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            metrics_addr: None,
        }
    }
}

/// 会话存储配置
///
/// `max_batch` 必须小于 `buffer_size`，`flush_interval_secs` 至少为 1 秒，
/// 这两条约束在写入队列启动时校验。
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 每条写入管道的通道容量
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// 达到该数量立即批量写入
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
    /// 定时刷新间隔（秒），同时也是过期扫描间隔
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
    /// 会话有效期（秒）
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_buffer_size() -> usize {
    2000
}

fn default_max_batch() -> usize {
    1000
}

fn default_flush_interval_secs() -> u64 {
    1
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_batch: default_max_batch(),
            flush_interval_secs: default_flush_interval_secs(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl SessionConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// 首次启动时创建的管理员
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
    /// 管理员角色名称
    pub role: String,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_dir).extract()?;
        Ok(config)
    }

    /// 配置来源：`default.toml` < `{APP_ENV}.toml` < 环境变量
    pub fn figment(config_dir: &str) -> Figment {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
