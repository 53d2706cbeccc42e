pub mod data;

pub use data::{FrameFormat, ReportType, TelemetryRecord};

/// Dingtek 帧头标记。
pub const FRAME_HEAD: u8 = 0x80;

/// Dingtek 帧尾标记，同时作为帧累积的结束信号。
pub const FRAME_TAIL: u8 = 0x81;

/// DF555 设备类型字节。
pub const DEVICE_TYPE_DF555: u8 = 0x05;
