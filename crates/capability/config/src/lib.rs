//! 接入服务运行配置加载。

use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 接入服务运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tcp_host: String,
    pub tcp_port: u16,
    pub read_timeout_ms: u64,
    pub max_frame_bytes: usize,
    /// 在途连接上限，None 表示不限制
    pub max_connections: Option<usize>,
    pub app_url: String,
    pub sink_path: String,
    pub sink_timeout_ms: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let tcp_host = env::var("TANK_TCP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let tcp_port = read_u16_with_default("TANK_TCP_PORT", 8888)?;
        let read_timeout_ms = read_u64_with_default("TANK_READ_TIMEOUT_MS", 5000)?;
        let max_frame_bytes = read_usize_with_default("TANK_MAX_FRAME_BYTES", 4096)?;
        let max_connections =
            read_optional_usize("TANK_MAX_CONNECTIONS")?.filter(|value| *value > 0);
        let app_url = env::var("TANK_APP_URL").unwrap_or_else(|_| "http://localhost".to_string());
        let sink_path = env::var("TANK_SINK_PATH")
            .unwrap_or_else(|_| "/api/sensors/dingtek/data".to_string());
        let sink_timeout_ms = read_u64_with_default("TANK_SINK_TIMEOUT_MS", 10_000)?;

        Ok(Self {
            tcp_host,
            tcp_port,
            read_timeout_ms,
            max_frame_bytes,
            max_connections,
            app_url,
            sink_path,
            sink_timeout_ms,
        })
    }

    /// 监听地址（host:port）。
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.tcp_host, self.tcp_port)
    }

    /// 下游接口完整 URL：应用地址 + 固定路径。
    pub fn sink_url(&self) -> String {
        format!(
            "{}/{}",
            self.app_url.trim_end_matches('/'),
            self.sink_path.trim_start_matches('/')
        )
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    match env::var(key) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        Err(_) => Ok(None),
    }
}
