/// 上报类型（帧头第 4 字节）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportType {
    /// 触发上报 (0x01)
    Trigger,
    /// 心跳 (0x02)
    Heartbeat,
    /// 指令回复 (0x03)
    CommandReply,
    /// 未知类型，保留原始字节
    Unknown(u8),
}

impl ReportType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => Self::Trigger,
            0x02 => Self::Heartbeat,
            0x03 => Self::CommandReply,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Trigger => 0x01,
            Self::Heartbeat => 0x02,
            Self::CommandReply => 0x03,
            Self::Unknown(code) => code,
        }
    }

    /// 可读名称（下游接口沿用）。
    pub fn name(self) -> &'static str {
        match self {
            Self::Trigger => "Trigger Report",
            Self::Heartbeat => "Heartbeat",
            Self::CommandReply => "Command Reply",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// 是否携带测量载荷（仅触发与心跳）。
    pub fn carries_measurement(self) -> bool {
        matches!(self, Self::Trigger | Self::Heartbeat)
    }
}

/// 报文来源格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// 文本：CSV 或 key=value / key:value
    Ascii,
    /// Dingtek 二进制帧
    Binary,
}

/// 规范化后的传感器遥测记录。
///
/// 每个解码成功的帧生成一条，交给下游后即丢弃。所有测量字段都是可选的：
/// 截断的二进制载荷只填充能完整读出的字段。
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub format: FrameFormat,
    pub device_id: Option<String>,
    /// 距离（米），原始毫米值 ÷ 1000
    pub distance_m: Option<f64>,
    /// 原始高度（毫米），仅二进制模式
    pub height_mm: Option<u16>,
    pub has_gps: Option<bool>,
    pub longitude: Option<f32>,
    pub latitude: Option<f32>,
    pub temperature_c: Option<i32>,
    pub status_full: Option<bool>,
    pub status_fire: Option<bool>,
    pub status_power: Option<bool>,
    /// 电池电压（伏）
    pub battery_level_v: Option<f64>,
    /// 电池电压（毫伏），原始值 × 10
    pub battery_voltage_mv: Option<u32>,
    pub rsrp: Option<f32>,
    /// 文本模式上报的信号强度
    pub rssi: Option<i32>,
    pub frame_count: Option<u16>,
    /// Unix 秒
    pub timestamp: Option<u32>,
    pub report_type: Option<ReportType>,
}

impl TelemetryRecord {
    /// 指定来源格式的空记录。
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            device_id: None,
            distance_m: None,
            height_mm: None,
            has_gps: None,
            longitude: None,
            latitude: None,
            temperature_c: None,
            status_full: None,
            status_fire: None,
            status_power: None,
            battery_level_v: None,
            battery_voltage_mv: None,
            rsrp: None,
            rssi: None,
            frame_count: None,
            timestamp: None,
            report_type: None,
        }
    }

    /// 是否没有任何测量字段（`format` 与 `report_type` 不计入）。
    pub fn is_empty(&self) -> bool {
        self.device_id.is_none()
            && self.distance_m.is_none()
            && self.height_mm.is_none()
            && self.has_gps.is_none()
            && self.longitude.is_none()
            && self.latitude.is_none()
            && self.temperature_c.is_none()
            && self.status_full.is_none()
            && self.status_fire.is_none()
            && self.status_power.is_none()
            && self.battery_level_v.is_none()
            && self.battery_voltage_mv.is_none()
            && self.rsrp.is_none()
            && self.rssi.is_none()
            && self.frame_count.is_none()
            && self.timestamp.is_none()
    }
}
