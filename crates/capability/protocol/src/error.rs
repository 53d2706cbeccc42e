//! 协议错误类型定义

/// 传输与配置错误（接入、读写、配置解析）
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置解析错误
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

/// 帧结构缺陷
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameDefect {
    #[error("frame too short: {len} bytes")]
    TooShort { len: usize },
    #[error("invalid head: expected 0x80, got 0x{got:02X}")]
    BadHead { got: u8 },
    #[error("invalid tail: expected 0x81, got 0x{got:02X}")]
    BadTail { got: u8 },
}

/// 解码失败（不是异常，由调用方记录后继续）
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeFailure {
    /// 二进制帧结构非法
    #[error("invalid frame: {0}")]
    InvalidFrame(FrameDefect),

    /// 两种格式都没有解出任何字段
    #[error("unparseable payload")]
    Unparseable,

    /// 上报类型不支持载荷解析
    #[error("unsupported report type 0x{0:02X}")]
    UnsupportedReportType(u8),
}

impl DecodeFailure {
    /// 稳定的失败原因，用于日志与计数。
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidFrame(_) => "invalid_frame",
            Self::Unparseable => "unparseable",
            Self::UnsupportedReportType(_) => "unsupported_report_type",
        }
    }
}

impl From<FrameDefect> for DecodeFailure {
    fn from(defect: FrameDefect) -> Self {
        Self::InvalidFrame(defect)
    }
}
