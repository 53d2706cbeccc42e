//! 帧累积
//!
//! 传感器经蜂窝链路上报，数据可能被切成任意大小的块到达。累积器把同一连接上的
//! 字节拼接起来，直到出现以下任一情况：
//!
//! - 最后一个字节是帧尾 `0x81`
//! - 对端关闭连接（读到 0 字节）
//! - 读取截止时间到达
//! - 缓冲达到大小上限
//!
//! 文本格式的上报一般不会以 `0x81` 结尾，因此会走超时或对端关闭的路径。

use crate::error::ProtocolError;
use domain::FRAME_TAIL;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{Instant, timeout_at};

const READ_CHUNK: usize = 2048;

/// 默认读取截止时间
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// 默认帧大小上限
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

/// 停止读取的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCompletion {
    /// 收到帧尾 `0x81`
    TailMarker,
    /// 对端关闭
    PeerClosed,
    /// 截止时间到达
    TimedOut,
    /// 达到大小上限
    SizeLimit,
}

impl FrameCompletion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TailMarker => "tail_marker",
            Self::PeerClosed => "peer_closed",
            Self::TimedOut => "timed_out",
            Self::SizeLimit => "size_limit",
        }
    }
}

/// 单次连接累积到的原始字节
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    bytes: Vec<u8>,
    completion: FrameCompletion,
}

impl RawFrame {
    pub fn new(bytes: Vec<u8>, completion: FrameCompletion) -> Self {
        Self { bytes, completion }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn completion(&self) -> FrameCompletion {
        self.completion
    }
}

/// 按连接累积字节，直到帧完成或超时。
#[derive(Debug, Clone, Copy)]
pub struct FrameAccumulator {
    max_wait: Duration,
    max_bytes: usize,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_READ_TIMEOUT, DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameAccumulator {
    pub fn new(max_wait: Duration, max_bytes: usize) -> Self {
        Self {
            max_wait,
            max_bytes: max_bytes.max(1),
        }
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// 读取一帧。
    ///
    /// 超时与对端关闭都不是错误，返回已累积的字节（可能为空或不完整）。
    /// 只有底层读失败（如连接被重置）才返回 `Err`。
    pub async fn accumulate<R>(&self, reader: &mut R) -> Result<RawFrame, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let deadline = Instant::now() + self.max_wait;
        let mut buffer = Vec::with_capacity(READ_CHUNK.min(self.max_bytes));
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let want = READ_CHUNK.min(self.max_bytes - buffer.len());
            let n = match timeout_at(deadline, reader.read(&mut chunk[..want])).await {
                Ok(read) => read?,
                Err(_) => return Ok(RawFrame::new(buffer, FrameCompletion::TimedOut)),
            };

            if n == 0 {
                return Ok(RawFrame::new(buffer, FrameCompletion::PeerClosed));
            }
            buffer.extend_from_slice(&chunk[..n]);

            if buffer.last() == Some(&FRAME_TAIL) {
                return Ok(RawFrame::new(buffer, FrameCompletion::TailMarker));
            }
            if buffer.len() >= self.max_bytes {
                return Ok(RawFrame::new(buffer, FrameCompletion::SizeLimit));
            }
        }
    }
}
