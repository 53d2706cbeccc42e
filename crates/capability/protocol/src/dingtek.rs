//! Dingtek DF555 二进制帧
//!
//! ```text
//! [0x80][forced][device_type][report_type][packet_size][payload ...][0x81]
//! ```
//!
//! 触发 (0x01) / 心跳 (0x02) 载荷依次为（多字节字段均为大端）：
//!
//! | 字段 | 字节 | 说明 |
//! |---|---|---|
//! | height | 2 | 毫米 |
//! | gps_flag | 1 | 0x01 时后跟经度、纬度（各 4 字节 IEEE-754） |
//! | temperature | 1 | ℃，原样取值 |
//! | status | 2 | bit0 满溢、bit1 火警、bit2 电源 |
//! | battery | 2 | 单位 10mV |
//! | rsrp | 4 | IEEE-754 |
//! | frame_count | 2 | |
//! | timestamp | 4 | Unix 秒 |
//! | device_id | 8 | 1 + IMEI，十六进制输出 |
//!
//! 载荷长度按实际帧长计算，声明长度字节只用于诊断（1 字节无法表示超过 255 的载荷）。

use crate::error::{DecodeFailure, FrameDefect};
use domain::{DEVICE_TYPE_DF555, FRAME_HEAD, FRAME_TAIL, FrameFormat, ReportType, TelemetryRecord};
use tracing::{debug, warn};

/// 帧头长度
pub const HEADER_LEN: usize = 5;

/// 最短帧长（帧头 + 帧尾）
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

const GPS_PRESENT: u8 = 0x01;

const STATUS_FULL: u16 = 0x01;
const STATUS_FIRE: u16 = 0x02;
const STATUS_POWER: u16 = 0x04;

/// 解析后的帧头（仅用于解码过程，不持久化）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryFrameHeader {
    pub forced_bit: u8,
    pub device_type: u8,
    pub report_type: ReportType,
    /// 设备声明的包长，不参与切片
    pub declared_size: u8,
}

impl BinaryFrameHeader {
    pub fn is_df555(&self) -> bool {
        self.device_type == DEVICE_TYPE_DF555
    }
}

/// 校验帧头帧尾并切出载荷。
pub fn split_frame(data: &[u8]) -> Result<(BinaryFrameHeader, &[u8]), FrameDefect> {
    let len = data.len();
    if len < MIN_FRAME_LEN {
        return Err(FrameDefect::TooShort { len });
    }
    if data[0] != FRAME_HEAD {
        return Err(FrameDefect::BadHead { got: data[0] });
    }
    if data[len - 1] != FRAME_TAIL {
        return Err(FrameDefect::BadTail { got: data[len - 1] });
    }

    let header = BinaryFrameHeader {
        forced_bit: data[1],
        device_type: data[2],
        report_type: ReportType::from_byte(data[3]),
        declared_size: data[4],
    };
    Ok((header, &data[HEADER_LEN..len - 1]))
}

/// 解码完整二进制帧。
pub fn parse_binary(data: &[u8]) -> Result<TelemetryRecord, DecodeFailure> {
    let (header, payload) = split_frame(data)?;

    debug!(
        target: "tank.protocol",
        forced_bit = format_args!("0x{:02X}", header.forced_bit),
        device_type = format_args!("0x{:02X}", header.device_type),
        report_type = format_args!("0x{:02X}", header.report_type.code()),
        declared_size = header.declared_size,
        payload_len = payload.len(),
        "binary_header_parsed"
    );
    if !header.is_df555() {
        warn!(
            target: "tank.protocol",
            expected = "0x05",
            got = format_args!("0x{:02X}", header.device_type),
            "unexpected_device_type"
        );
    }

    parse_payload(payload, header.report_type)
}

/// 按上报类型解析载荷。
///
/// 字段逐个读取，剩余字节不足的字段被跳过而不是报错；
/// 一个字段都没有读出时视为失败。
pub fn parse_payload(
    payload: &[u8],
    report_type: ReportType,
) -> Result<TelemetryRecord, DecodeFailure> {
    if !report_type.carries_measurement() {
        return Err(DecodeFailure::UnsupportedReportType(report_type.code()));
    }

    let mut cursor = Cursor::new(payload);
    let mut record = TelemetryRecord::new(FrameFormat::Binary);

    if let Some(height) = cursor.u16() {
        record.height_mm = Some(height);
        record.distance_m = Some(f64::from(height) / 1000.0);
    }

    if let Some(gps_flag) = cursor.u8() {
        let has_gps = gps_flag == GPS_PRESENT;
        record.has_gps = Some(has_gps);
        if has_gps && cursor.remaining() >= 8 {
            record.longitude = cursor.f32();
            record.latitude = cursor.f32();
        }
    }

    // TODO: 确认真实设备零下温度的编码后再决定是否按有符号解释
    if let Some(temperature) = cursor.u8() {
        record.temperature_c = Some(i32::from(temperature));
    }

    if let Some(status) = cursor.u16() {
        record.status_full = Some(status & STATUS_FULL != 0);
        record.status_fire = Some(status & STATUS_FIRE != 0);
        record.status_power = Some(status & STATUS_POWER != 0);
    }

    if let Some(battery) = cursor.u16() {
        let millivolts = u32::from(battery) * 10;
        record.battery_voltage_mv = Some(millivolts);
        record.battery_level_v = Some(f64::from(millivolts) / 1000.0);
    }

    if let Some(rsrp) = cursor.f32() {
        record.rsrp = Some(rsrp);
    }

    if let Some(frame_count) = cursor.u16() {
        record.frame_count = Some(frame_count);
    }

    if let Some(timestamp) = cursor.u32() {
        record.timestamp = Some(timestamp);
    }

    if let Some(device_id) = cursor.take::<8>() {
        record.device_id = Some(hex::encode(device_id));
    }

    if record.is_empty() {
        return Err(DecodeFailure::Unparseable);
    }
    record.report_type = Some(report_type);
    Ok(record)
}

/// 顺序读取游标；不足宽度时返回 None 且不前进。
struct Cursor<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.offset.checked_add(N)?;
        let bytes: [u8; N] = self.buf.get(self.offset..end)?.try_into().ok()?;
        self.offset = end;
        Some(bytes)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take::<2>().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take::<4>().map(u32::from_be_bytes)
    }

    fn f32(&mut self) -> Option<f32> {
        self.take::<4>().map(f32::from_be_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(report_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = vec![FRAME_HEAD, 0x00, DEVICE_TYPE_DF555, report_type, payload.len() as u8];
        data.extend_from_slice(payload);
        data.push(FRAME_TAIL);
        data
    }

    #[test]
    fn header_fields() {
        let data = frame(0x01, &[0x07, 0xD0]);
        let (header, payload) = split_frame(&data).unwrap();
        assert_eq!(header.forced_bit, 0x00);
        assert!(header.is_df555());
        assert_eq!(header.report_type, ReportType::Trigger);
        assert_eq!(header.declared_size, 2);
        assert_eq!(payload, &[0x07, 0xD0]);
    }

    #[test]
    fn declared_size_is_not_trusted() {
        let mut data = frame(0x02, &[0x03, 0xE8, 0x00]);
        data[4] = 0xFF;
        let record = parse_binary(&data).unwrap();
        assert_eq!(record.height_mm, Some(1000));
        assert_eq!(record.has_gps, Some(false));
    }

    #[test]
    fn frame_defects() {
        assert_eq!(
            split_frame(&[0x80, 0x81]).unwrap_err(),
            FrameDefect::TooShort { len: 2 }
        );
        assert_eq!(
            split_frame(&[0x7F, 0, 5, 2, 0, 0x81]).unwrap_err(),
            FrameDefect::BadHead { got: 0x7F }
        );
        assert_eq!(
            split_frame(&[0x80, 0, 5, 2, 0, 0x00]).unwrap_err(),
            FrameDefect::BadTail { got: 0x00 }
        );
    }

    #[test]
    fn gps_block_when_flagged() {
        let mut payload = vec![0x01, 0xF4, GPS_PRESENT];
        payload.extend_from_slice(&114.05f32.to_be_bytes());
        payload.extend_from_slice(&22.55f32.to_be_bytes());
        payload.push(25);

        let record = parse_payload(&payload, ReportType::Trigger).unwrap();
        assert_eq!(record.has_gps, Some(true));
        assert_eq!(record.longitude, Some(114.05));
        assert_eq!(record.latitude, Some(22.55));
        assert_eq!(record.temperature_c, Some(25));
    }

    #[test]
    fn gps_flag_without_room_for_coordinates() {
        let payload = [0x01, 0xF4, GPS_PRESENT, 0x10, 0x20];
        let record = parse_payload(&payload, ReportType::Trigger).unwrap();
        assert_eq!(record.has_gps, Some(true));
        assert_eq!(record.longitude, None);
        assert_eq!(record.latitude, None);
        assert_eq!(record.temperature_c, Some(0x10));
    }

    #[test]
    fn status_bits() {
        let payload = [0x00, 0x00, 0x00, 20, 0x00, 0x05];
        let record = parse_payload(&payload, ReportType::Heartbeat).unwrap();
        assert_eq!(record.status_full, Some(true));
        assert_eq!(record.status_fire, Some(false));
        assert_eq!(record.status_power, Some(true));
    }

    #[test]
    fn skipped_field_does_not_consume_bytes() {
        // temperature 之后只剩 2 字节：status 读出，后续字段全部缺失
        let payload = [0x00, 0x64, 0x00, 18, 0x00, 0x02];
        let record = parse_payload(&payload, ReportType::Trigger).unwrap();
        assert_eq!(record.status_fire, Some(true));
        assert_eq!(record.battery_level_v, None);
        assert_eq!(record.device_id, None);
    }

    #[test]
    fn command_reply_is_unsupported() {
        assert_eq!(
            parse_payload(&[0x01, 0x02], ReportType::CommandReply).unwrap_err(),
            DecodeFailure::UnsupportedReportType(0x03)
        );
        assert_eq!(
            parse_binary(&frame(0x09, &[0x01])).unwrap_err(),
            DecodeFailure::UnsupportedReportType(0x09)
        );
    }

    #[test]
    fn empty_payload_is_unparseable() {
        assert_eq!(
            parse_binary(&frame(0x02, &[])).unwrap_err(),
            DecodeFailure::Unparseable
        );
        // 单字节载荷不够 height，gps_flag 读出 -> 非空
        assert!(parse_binary(&frame(0x02, &[0x00])).is_ok());
    }

    #[test]
    fn foreign_device_type_still_decodes() {
        let mut data = frame(0x02, &[0x07, 0xD0]);
        data[2] = 0x09;
        let record = parse_binary(&data).unwrap();
        assert_eq!(record.distance_m, Some(2.0));
    }
}
