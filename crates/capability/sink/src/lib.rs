//! # 下游投递能力模块
//!
//! 将解码后的 [`TelemetryRecord`] 交给外部协作方（应用的 HTTP 接口）。
//! 投递结果只记录日志，不回传给传感器连接。

mod payload;

use async_trait::async_trait;
use domain::TelemetryRecord;
use std::time::Duration;
use tracing::{info, warn};

pub use payload::TelemetryPayload;

/// 投递错误。
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// 遥测记录接收方抽象。
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn deliver(&self, record: TelemetryRecord) -> Result<(), SinkError>;
}

/// HTTP JSON 推送。
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(concat!("tank-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn deliver(&self, record: TelemetryRecord) -> Result<(), SinkError> {
        let payload = TelemetryPayload::from_record(&record);
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if status.is_success() {
            info!(
                target: "tank.sink",
                device_id = payload.device_id.unwrap_or("unknown"),
                status = status.as_u16(),
                "sink_forwarded"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            target: "tank.sink",
            status = status.as_u16(),
            body = %body,
            "sink_rejected"
        );
        Err(SinkError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
