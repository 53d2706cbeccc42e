//! 单连接处理
//!
//! 状态顺序固定：读取 → 解码 → 应答 → 关闭。每个连接只读一帧，不在同一连接内重试。
//! 连接对象由处理器独占持有，任何路径返回时都会被释放关闭。

use crate::decoder::decode;
use crate::error::{DecodeFailure, ProtocolError};
use crate::frame::FrameAccumulator;
use domain::TelemetryRecord;
use std::sync::Arc;
use tank_sink::TelemetrySink;
use tank_telemetry::{
    record_ack_written, record_decode_failure, record_decode_success, record_frame_empty,
    record_frame_received, record_sink_failure, record_sink_success,
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{Instrument, Span, debug, info, warn};

/// 收到非空数据后回写的应答
pub const ACK: &[u8] = b"OK\r\n";

/// 单个连接的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionOutcome {
    /// 没有收到任何字节，不应答
    Idle,
    /// 解码成功，记录已交给下游
    Decoded(TelemetryRecord),
    /// 收到数据但解码失败（仍然应答）
    DecodeFailed(DecodeFailure),
}

impl ConnectionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Decoded(_) => "decoded",
            Self::DecodeFailed(failure) => failure.reason(),
        }
    }
}

/// 连接处理器，所有连接共享同一个实例。
pub struct ConnectionHandler {
    accumulator: FrameAccumulator,
    sink: Arc<dyn TelemetrySink>,
}

impl ConnectionHandler {
    pub fn new(accumulator: FrameAccumulator, sink: Arc<dyn TelemetrySink>) -> Self {
        Self { accumulator, sink }
    }

    /// 处理一个连接直到关闭。
    ///
    /// 返回 `Err` 仅表示传输失败（读失败、应答写失败），连接同样会被关闭。
    pub async fn handle<S>(&self, mut stream: S) -> Result<ConnectionOutcome, ProtocolError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let frame = self.accumulator.accumulate(&mut stream).await?;
        if frame.is_empty() {
            record_frame_empty();
            info!(
                target: "tank.ingest",
                completion = frame.completion().as_str(),
                "no_data_received"
            );
            return Ok(ConnectionOutcome::Idle);
        }

        record_frame_received();
        info!(
            target: "tank.ingest",
            len = frame.len(),
            completion = frame.completion().as_str(),
            preview = %String::from_utf8_lossy(&frame.as_bytes()[..frame.len().min(200)]),
            "frame_received"
        );

        let outcome = match decode(frame.as_bytes()) {
            Ok(record) => {
                record_decode_success();
                info!(
                    target: "tank.ingest",
                    format = ?record.format,
                    device_id = record.device_id.as_deref().unwrap_or("unknown"),
                    report_type = record.report_type.map(|t| t.name()).unwrap_or("-"),
                    "frame_decoded"
                );
                self.forward(record.clone());
                ConnectionOutcome::Decoded(record)
            }
            Err(failure) => {
                record_decode_failure();
                ConnectionOutcome::DecodeFailed(failure)
            }
        };

        stream.write_all(ACK).await?;
        stream.flush().await?;
        record_ack_written();
        if let Err(err) = stream.shutdown().await {
            debug!(target: "tank.ingest", error = %err, "shutdown_failed");
        }

        Ok(outcome)
    }

    /// 异步投递，下游的成败不影响当前连接。
    fn forward(&self, record: TelemetryRecord) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(
            async move {
                let device_id = record.device_id.clone();
                match sink.deliver(record).await {
                    Ok(()) => record_sink_success(),
                    Err(err) => {
                        record_sink_failure();
                        warn!(
                            target: "tank.ingest",
                            device_id = device_id.as_deref().unwrap_or("unknown"),
                            error = %err,
                            "sink_failed"
                        );
                    }
                }
            }
            .instrument(Span::current()),
        );
    }
}
