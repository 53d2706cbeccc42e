//! # 传感器协议能力模块
//!
//! 接收 Dingtek DF555 超声波液位传感器经 GPRS/4G 直连上报的数据：
//! - **帧累积**：按连接拼接字节，帧尾 `0x81`、对端关闭或超时结束
//! - **解码**：先按文本（CSV / 键值对）解析，失败再按二进制帧解析
//! - **TCP 接入**：每连接一个任务，应答 `OK\r\n` 后关闭
//!
//! ## 架构设计
//!
//! ```text
//! TcpListener (IngestionServer)
//!       │ accept
//!       ▼
//! ConnectionHandler ── FrameAccumulator ── RawFrame
//!       │
//!       ▼
//! decode ── ascii / dingtek ── TelemetryRecord
//!       │
//!       ├── OK\r\n → 传感器
//!       └── TelemetrySink（异步投递，不阻塞连接）
//! ```
//!
//! ## 配置格式
//!
//! ```json
//! { "listen_port": 8888, "read_timeout_ms": 5000, "max_frame_bytes": 4096, "max_connections": 256 }
//! ```

mod ascii;
mod connection;
mod decoder;
pub mod dingtek;
mod error;
mod frame;
mod tcp_server;

pub use connection::{ACK, ConnectionHandler, ConnectionOutcome};
pub use decoder::{decode, hex_preview};
pub use dingtek::BinaryFrameHeader;
pub use error::{DecodeFailure, FrameDefect, ProtocolError};
pub use frame::{
    DEFAULT_MAX_FRAME_BYTES, DEFAULT_READ_TIMEOUT, FrameAccumulator, FrameCompletion, RawFrame,
};
pub use tcp_server::{IngestConfig, IngestionServer};
