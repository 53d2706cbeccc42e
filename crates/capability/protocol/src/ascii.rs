//! 文本格式解析
//!
//! 支持两种写法，按行处理：
//!
//! ```text
//! dev1,1500,21,3.6,-85                 // CSV：device_id,distance_mm[,temperature[,battery[,rssi]]]
//! device=dev1;distance=1500;temp=21    // key=value / key:value，以 , 或 ; 分隔
//! ```
//!
//! 只有解出 device_id 才算成功。数值取开头的数字部分（`1500mm` 读作 1500），
//! 首尾的空白和 NUL 都会被去掉。

use domain::{FRAME_HEAD, FrameFormat, TelemetryRecord};

/// 尝试按文本格式解析；以帧头 `0x80` 开头的输入留给二进制解析。
pub(crate) fn parse_ascii(data: &[u8]) -> Option<TelemetryRecord> {
    if data.first() == Some(&FRAME_HEAD) {
        return None;
    }
    let text = String::from_utf8_lossy(data);
    let mut record = TelemetryRecord::new(FrameFormat::Ascii);

    for line in trim_padding(&text).split('\n') {
        let line = trim_padding(line);

        if let Some(csv) = parse_csv_line(line) {
            return Some(csv);
        }

        if line.contains([':', '=']) {
            apply_pairs(line, &mut record);
        }
    }

    record.device_id.is_some().then_some(record)
}

/// CSV 行：首列为 device_id，其余按位置解析。
///
/// 首列本身是 `key=value` 时视为键值行，不走 CSV。
fn parse_csv_line(line: &str) -> Option<TelemetryRecord> {
    if !line.contains(',') {
        return None;
    }

    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let device_id = parts[0];
    if device_id.is_empty() || device_id.contains([':', '=']) {
        return None;
    }

    let mut record = TelemetryRecord::new(FrameFormat::Ascii);
    record.device_id = Some(device_id.to_string());
    record.distance_m = parts.get(1).and_then(|v| parse_number(v)).map(|mm| mm / 1000.0);
    record.temperature_c = parts.get(2).and_then(|v| parse_number(v)).map(round_to_i32);
    record.battery_level_v = parts.get(3).and_then(|v| parse_number(v));
    record.rssi = parts.get(4).and_then(|v| parse_number(v)).map(|v| v as i32);
    Some(record)
}

/// 键值对，键名大小写不敏感、按子串匹配，先匹配者优先。
fn apply_pairs(line: &str, record: &mut TelemetryRecord) {
    for pair in line.split([',', ';']) {
        let Some((key, value)) = split_pair(pair.trim()) else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if key.contains("device") || key.contains("id") {
            record.device_id = Some(value.to_string());
        } else if key.contains("distance") || key.contains("level") {
            if let Some(mm) = parse_number(value) {
                record.distance_m = Some(mm / 1000.0);
            }
        } else if key.contains("temp") {
            if let Some(temp) = parse_number(value) {
                record.temperature_c = Some(round_to_i32(temp));
            }
        } else if key.contains("battery") || key.contains("bat") {
            if let Some(battery) = parse_number(value) {
                record.battery_level_v = Some(battery);
            }
        } else if key.contains("rssi") || key.contains("signal") {
            if let Some(rssi) = parse_number(value) {
                record.rssi = Some(rssi as i32);
            }
        }
    }
}

/// 在第一个 `:` 或 `=` 处切分；键和值都至少一个字符。
fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (idx, sep) = pair
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == ':' || *c == '=')?;
    let value = &pair[idx + sep.len_utf8()..];
    if value.is_empty() {
        return None;
    }
    Some((&pair[..idx], value))
}

fn trim_padding(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

/// 解析开头的数字部分，其后的单位等字符忽略；没有数字时返回 `None`。
fn parse_number(value: &str) -> Option<f64> {
    let bytes = value.trim_start().as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    std::str::from_utf8(&bytes[..end])
        .ok()?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn round_to_i32(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_minimal() {
        let record = parse_ascii(b"dev1,500").unwrap();
        assert_eq!(record.format, FrameFormat::Ascii);
        assert_eq!(record.device_id.as_deref(), Some("dev1"));
        assert_eq!(record.distance_m, Some(0.5));
        assert_eq!(record.temperature_c, None);
    }

    #[test]
    fn csv_all_columns() {
        let record = parse_ascii(b"tank-7, 1250, 21.6, 3.6, -85\r\n").unwrap();
        assert_eq!(record.device_id.as_deref(), Some("tank-7"));
        assert_eq!(record.distance_m, Some(1.25));
        assert_eq!(record.temperature_c, Some(22));
        assert_eq!(record.battery_level_v, Some(3.6));
        assert_eq!(record.rssi, Some(-85));
    }

    #[test]
    fn csv_unparseable_column_is_skipped() {
        let record = parse_ascii(b"dev1,abc,20").unwrap();
        assert_eq!(record.distance_m, None);
        assert_eq!(record.temperature_c, Some(20));
    }

    #[test]
    fn key_value_pairs() {
        let record = parse_ascii(b"DeviceID=abc;Distance=1500;Temp=19;Bat=3.4;Signal=-90").unwrap();
        assert_eq!(record.device_id.as_deref(), Some("abc"));
        assert_eq!(record.distance_m, Some(1.5));
        assert_eq!(record.temperature_c, Some(19));
        assert_eq!(record.battery_level_v, Some(3.4));
        assert_eq!(record.rssi, Some(-90));
    }

    #[test]
    fn key_value_with_commas_and_colons() {
        let record = parse_ascii(b"device: pump-2, level: 800").unwrap();
        assert_eq!(record.device_id.as_deref(), Some("pump-2"));
        assert_eq!(record.distance_m, Some(0.8));
    }

    #[test]
    fn key_value_spread_over_lines() {
        let record = parse_ascii(b"distance=2000\ntemperature=5\nid=north-tank\n").unwrap();
        assert_eq!(record.device_id.as_deref(), Some("north-tank"));
        assert_eq!(record.distance_m, Some(2.0));
        assert_eq!(record.temperature_c, Some(5));
    }

    #[test]
    fn missing_device_id_is_rejected() {
        assert!(parse_ascii(b"distance=2000;temp=5").is_none());
        assert!(parse_ascii(b"hello world").is_none());
        assert!(parse_ascii(b"").is_none());
        assert!(parse_ascii(b",500").is_none());
    }

    #[test]
    fn binary_bytes_are_not_text() {
        assert!(parse_ascii(&[0x80, 0x00, 0x05, 0x02, 0x2c, 0x2c, 0x81]).is_none());
    }

    #[test]
    fn nul_padding_is_trimmed() {
        let record = parse_ascii(b"dev1,500\0").unwrap();
        assert_eq!(record.distance_m, Some(0.5));

        let record = parse_ascii(b"\0device=a;temp=7\0\0\n").unwrap();
        assert_eq!(record.device_id.as_deref(), Some("a"));
        assert_eq!(record.temperature_c, Some(7));
    }

    #[test]
    fn units_after_numbers_are_ignored() {
        let record = parse_ascii(b"dev1,1500mm,21C,3.6V,-85dBm").unwrap();
        assert_eq!(record.distance_m, Some(1.5));
        assert_eq!(record.temperature_c, Some(21));
        assert_eq!(record.battery_level_v, Some(3.6));
        assert_eq!(record.rssi, Some(-85));
    }

    #[test]
    fn non_utf8_text_is_still_parsed() {
        let record = parse_ascii(b"T\xe4nk,500").unwrap();
        assert!(record.device_id.is_some());
        assert_eq!(record.distance_m, Some(0.5));
    }

    #[test]
    fn numeric_prefix() {
        assert_eq!(parse_number("1500"), Some(1500.0));
        assert_eq!(parse_number(" -85dBm"), Some(-85.0));
        assert_eq!(parse_number("3.6V"), Some(3.6));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e3x"), Some(1000.0));
        assert_eq!(parse_number("2e"), Some(2.0));
        assert_eq!(parse_number("mm"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn split_pair_needs_key_and_value() {
        assert_eq!(split_pair("a=b"), Some(("a", "b")));
        assert_eq!(split_pair("a:b=c"), Some(("a", "b=c")));
        assert_eq!(split_pair("=b"), None);
        assert_eq!(split_pair("a="), None);
    }
}
