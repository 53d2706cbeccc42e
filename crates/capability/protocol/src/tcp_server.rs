//! TCP 接入服务
//!
//! 监听 TCP 端口，每个连接派生一个独立任务，由 [`ConnectionHandler`] 处理。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = IngestConfig::from_json(r#"{ "listen_port": 8888 }"#)?;
//! let server = IngestionServer::new(config, sink);
//! let listener = server.bind().await?;
//! server.serve_with_shutdown(listener, shutdown_signal()).await?;
//! ```

use crate::connection::ConnectionHandler;
use crate::error::ProtocolError;
use crate::frame::FrameAccumulator;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tank_sink::TelemetrySink;
use tank_telemetry::{new_connection_id, record_accept_error, record_connection_accepted};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{Instrument, error, info, info_span, warn};

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// 接入服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 监听地址
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    /// 监听端口
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// 单连接读取截止时间（毫秒）
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// 单帧大小上限
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// 在途连接上限，不设置则不限制
    #[serde(default)]
    pub max_connections: Option<usize>,
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8888
}

fn default_read_timeout() -> u64 {
    5000
}

fn default_max_frame_bytes() -> usize {
    4096
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            read_timeout_ms: default_read_timeout(),
            max_frame_bytes: default_max_frame_bytes(),
            max_connections: None,
        }
    }
}

impl IngestConfig {
    /// 从 JSON 配置字符串解析
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::ConfigParse(e.to_string()))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    pub fn accumulator(&self) -> FrameAccumulator {
        FrameAccumulator::new(
            Duration::from_millis(self.read_timeout_ms),
            self.max_frame_bytes,
        )
    }
}

/// 传感器接入服务
pub struct IngestionServer {
    config: IngestConfig,
    handler: Arc<ConnectionHandler>,
    limiter: Option<Arc<Semaphore>>,
}

impl IngestionServer {
    pub fn new(config: IngestConfig, sink: Arc<dyn TelemetrySink>) -> Self {
        let handler = Arc::new(ConnectionHandler::new(config.accumulator(), sink));
        let limiter = config
            .max_connections
            .filter(|limit| *limit > 0)
            .map(|limit| Arc::new(Semaphore::new(limit)));
        Self {
            config,
            handler,
            limiter,
        }
    }

    /// 绑定配置中的监听地址
    pub async fn bind(&self) -> Result<TcpListener, ProtocolError> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(target: "tank.ingest", addr = %addr, "tcp server listening");
        Ok(listener)
    }

    /// 在给定监听器上接受连接，直到 `shutdown` 完成。
    ///
    /// 停止后不再接受新连接；已派生的连接任务按各自的截止时间自然结束。
    pub async fn serve_with_shutdown<F>(
        &self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ProtocolError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = acquire(self.limiter.clone()) => permit,
            };

            let accepted = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer_addr)) => self.spawn_connection(stream, peer_addr, permit),
                Err(e) => {
                    record_accept_error();
                    error!(target: "tank.ingest", error = %e, "failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }

        info!(target: "tank.ingest", "tcp server stopped accepting");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        record_connection_accepted();
        let handler = Arc::clone(&self.handler);
        let span = info_span!(
            "connection",
            connection_id = %new_connection_id(),
            peer = %peer_addr
        );

        tokio::spawn(
            async move {
                let _permit = permit;
                info!(target: "tank.ingest", "new connection");
                match handler.handle(stream).await {
                    Ok(outcome) => {
                        info!(target: "tank.ingest", outcome = outcome.as_str(), "connection closed")
                    }
                    Err(e) => warn!(target: "tank.ingest", error = %e, "connection abandoned"),
                }
            }
            .instrument(span),
        );
    }
}

async fn acquire(limiter: Option<Arc<Semaphore>>) -> Option<OwnedSemaphorePermit> {
    match limiter {
        Some(limiter) => limiter.acquire_owned().await.ok(),
        None => None,
    }
}
