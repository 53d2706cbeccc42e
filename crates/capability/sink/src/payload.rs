//! 下游接口报文。
//!
//! 字段名沿用应用接口既有约定（`distance`、`battery_level`、`temperature` 等），
//! 缺失的字段不输出。

use domain::{FrameFormat, TelemetryRecord};
use serde::Serialize;

/// 单条遥测记录的 JSON 报文。
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryPayload<'a> {
    pub source_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_mm: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_gps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_full: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_fire: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_power: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_voltage_mv: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsrp: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u32>,
    /// UTC，`YYYY-MM-DD HH:MM:SS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_readable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type_name: Option<&'static str>,
}

impl<'a> TelemetryPayload<'a> {
    pub fn from_record(record: &'a TelemetryRecord) -> Self {
        Self {
            source_format: match record.format {
                FrameFormat::Ascii => "ascii",
                FrameFormat::Binary => "binary",
            },
            device_id: record.device_id.as_deref(),
            distance: record.distance_m,
            height_mm: record.height_mm,
            has_gps: record.has_gps,
            longitude: record.longitude,
            latitude: record.latitude,
            temperature: record.temperature_c,
            status_full: record.status_full,
            status_fire: record.status_fire,
            status_power: record.status_power,
            battery_level: record.battery_level_v,
            battery_voltage_mv: record.battery_voltage_mv,
            rsrp: record.rsrp,
            rssi: record.rssi,
            frame_count: record.frame_count,
            timestamp: record.timestamp,
            timestamp_readable: record.timestamp.and_then(readable_timestamp),
            report_type: record.report_type.map(|report_type| report_type.code()),
            report_type_name: record.report_type.map(|report_type| report_type.name()),
        }
    }
}

fn readable_timestamp(epoch_secs: u32) -> Option<String> {
    chrono::DateTime::from_timestamp(i64::from(epoch_secs), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ReportType;

    #[test]
    fn binary_record_uses_receiver_field_names() {
        let mut record = TelemetryRecord::new(FrameFormat::Binary);
        record.device_id = Some("0861234567890123".to_string());
        record.distance_m = Some(2.0);
        record.battery_level_v = Some(3.6);
        record.temperature_c = Some(30);
        record.timestamp = Some(1_600_000_000);
        record.report_type = Some(ReportType::Heartbeat);

        let json = serde_json::to_value(TelemetryPayload::from_record(&record)).unwrap();
        assert_eq!(json["source_format"], "binary");
        assert_eq!(json["device_id"], "0861234567890123");
        assert_eq!(json["distance"], 2.0);
        assert_eq!(json["battery_level"], 3.6);
        assert_eq!(json["temperature"], 30);
        assert_eq!(json["timestamp_readable"], "2020-09-13 12:26:40");
        assert_eq!(json["report_type"], 2);
        assert_eq!(json["report_type_name"], "Heartbeat");
    }

    #[test]
    fn absent_fields_are_omitted() {
        let mut record = TelemetryRecord::new(FrameFormat::Ascii);
        record.device_id = Some("dev1".to_string());

        let json = serde_json::to_value(TelemetryPayload::from_record(&record)).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert!(!object.contains_key("longitude"));
        assert!(!object.contains_key("report_type_name"));
    }
}
