//! 格式识别与解码入口
//!
//! 先尝试文本格式（成功即确定），再尝试二进制帧。

use crate::ascii::parse_ascii;
use crate::dingtek::parse_binary;
use crate::error::DecodeFailure;
use domain::TelemetryRecord;
use tracing::{debug, warn};

/// 诊断日志中十六进制预览的最大字节数
const HEX_PREVIEW_LEN: usize = 256;

/// 解码一帧字节为遥测记录。
pub fn decode(data: &[u8]) -> Result<TelemetryRecord, DecodeFailure> {
    if let Some(record) = parse_ascii(data) {
        debug!(target: "tank.protocol", device_id = ?record.device_id, "ascii_decoded");
        return Ok(record);
    }

    match parse_binary(data) {
        Ok(record) => {
            debug!(target: "tank.protocol", device_id = ?record.device_id, "binary_decoded");
            Ok(record)
        }
        Err(failure) => {
            warn!(
                target: "tank.protocol",
                reason = failure.reason(),
                detail = %failure,
                len = data.len(),
                hex = %hex_preview(data),
                "decode_failed"
            );
            Err(failure)
        }
    }
}

/// 十六进制预览，超长部分截断。
pub fn hex_preview(data: &[u8]) -> String {
    if data.len() <= HEX_PREVIEW_LEN {
        return hex::encode(data);
    }
    format!("{}...", hex::encode(&data[..HEX_PREVIEW_LEN]))
}
