//! 追踪初始化、连接 ID 生成与接入计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 接入计数快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub accept_errors: u64,
    pub frames_received: u64,
    pub frames_empty: u64,
    pub decode_success: u64,
    pub decode_failure: u64,
    pub acks_written: u64,
    pub sink_success: u64,
    pub sink_failure: u64,
}

/// 接入计数器。
pub struct IngestMetrics {
    connections_accepted: AtomicU64,
    accept_errors: AtomicU64,
    frames_received: AtomicU64,
    frames_empty: AtomicU64,
    decode_success: AtomicU64,
    decode_failure: AtomicU64,
    acks_written: AtomicU64,
    sink_success: AtomicU64,
    sink_failure: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            connections_accepted: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_empty: AtomicU64::new(0),
            decode_success: AtomicU64::new(0),
            decode_failure: AtomicU64::new(0),
            acks_written: AtomicU64::new(0),
            sink_success: AtomicU64::new(0),
            sink_failure: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_empty: self.frames_empty.load(Ordering::Relaxed),
            decode_success: self.decode_success.load(Ordering::Relaxed),
            decode_failure: self.decode_failure.load(Ordering::Relaxed),
            acks_written: self.acks_written.load(Ordering::Relaxed),
            sink_success: self.sink_success.load(Ordering::Relaxed),
            sink_failure: self.sink_failure.load(Ordering::Relaxed),
        }
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<IngestMetrics> = OnceLock::new();

/// 获取全局计数器实例。
pub fn metrics() -> &'static IngestMetrics {
    METRICS.get_or_init(IngestMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 connection_id，用于串联单个连接的日志。
pub fn new_connection_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn record_connection_accepted() {
    metrics().connections_accepted.fetch_add(1, Ordering::Relaxed);
}

/// 记录 accept 失败次数（不会终止服务）。
pub fn record_accept_error() {
    metrics().accept_errors.fetch_add(1, Ordering::Relaxed);
}

/// 记录读到非空帧的次数。
pub fn record_frame_received() {
    metrics().frames_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录空帧（超时或对端关闭且无数据）。
pub fn record_frame_empty() {
    metrics().frames_empty.fetch_add(1, Ordering::Relaxed);
}

pub fn record_decode_success() {
    metrics().decode_success.fetch_add(1, Ordering::Relaxed);
}

pub fn record_decode_failure() {
    metrics().decode_failure.fetch_add(1, Ordering::Relaxed);
}

pub fn record_ack_written() {
    metrics().acks_written.fetch_add(1, Ordering::Relaxed);
}

/// 记录下游投递成功次数。
pub fn record_sink_success() {
    metrics().sink_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录下游投递失败次数。
pub fn record_sink_failure() {
    metrics().sink_failure.fetch_add(1, Ordering::Relaxed);
}
