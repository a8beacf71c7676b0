//! Frame validation and normalization into display units.

use chrono::{Local, TimeZone};
use serde_json::Value;

use crate::error::ParseError;
use crate::types::{RawFrame, Sample, FRAME_KEYS, NO_TIME_LABEL, UNKNOWN_NAME};

pub const BYTES_PER_GIB: f64 = (1u64 << 30) as f64;

/// Validate a raw payload against the frame schema.
pub fn parse_frame(payload: &[u8]) -> Result<RawFrame, ParseError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let Value::Object(map) = &value else {
        return Err(ParseError::NotAnObject);
    };
    if !FRAME_KEYS.iter().any(|k| map.contains_key(*k)) {
        return Err(ParseError::MissingFields);
    }
    serde_json::from_value(value).map_err(|e| ParseError::InvalidField(e.to_string()))
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

/// Local time-of-day for chart axes. Lossy; never use it for ordering.
pub fn time_label(ts: f64) -> String {
    if !ts.is_finite() {
        return NO_TIME_LABEL.to_string();
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9) as u32;
    match Local.timestamp_opt(secs as i64, nanos).earliest() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => NO_TIME_LABEL.to_string(),
    }
}

pub fn normalize(raw: RawFrame) -> Sample {
    let timestamp = raw.timestamp.unwrap_or(0.0);
    let memory_used_bytes = raw.memory_used.unwrap_or(0);
    let memory_total_bytes = raw.memory_total.unwrap_or(0);
    Sample {
        timestamp,
        time_label: raw
            .timestamp
            .map_or_else(|| NO_TIME_LABEL.to_string(), time_label),
        name: raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        index: raw.index,
        memory_used_bytes,
        memory_total_bytes,
        memory_free_bytes: raw.memory_free,
        memory_used_gib: bytes_to_gib(memory_used_bytes),
        memory_total_gib: bytes_to_gib(memory_total_bytes),
        utilization_pct: raw.utilization.unwrap_or(0.0),
        temperature_c: raw.temperature.unwrap_or(0.0),
        process_count: raw.process_count.unwrap_or(0),
        power_w: raw.power_usage.map(|mw| mw as f64 / 1000.0),
    }
}

/// `parse_frame` then `normalize`.
pub fn sample_from_payload(payload: &[u8]) -> Result<Sample, ParseError> {
    parse_frame(payload).map(normalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gib_conversion_is_exact() {
        let s = sample_from_payload(
            br#"{"timestamp": 1700000000, "Name": "RTX 4090", "MemoryUsed": 8589934592, "MemoryTotal": 17179869184, "Utilization": 42, "Temperature": 61, "ProcessCount": 3}"#,
        )
        .unwrap();
        assert_eq!(s.memory_used_gib, 8.0);
        assert_eq!(s.memory_total_gib, 16.0);
        assert_eq!(s.memory_label(), "8.00GB / 16.00GB");
        assert_eq!(s.name, "RTX 4090");
        assert_eq!(s.utilization_pct, 42.0);
        assert_eq!(s.temperature_c, 61.0);
        assert_eq!(s.process_count, 3);
    }

    #[test]
    fn missing_fields_default() {
        let s = sample_from_payload(br#"{"Utilization": 12.5}"#).unwrap();
        assert_eq!(s.name, UNKNOWN_NAME);
        assert_eq!(s.memory_used_bytes, 0);
        assert_eq!(s.memory_total_gib, 0.0);
        assert_eq!(s.temperature_c, 0.0);
        assert_eq!(s.process_count, 0);
        assert_eq!(s.utilization_pct, 12.5);
        assert_eq!(s.power_w, None);
    }

    #[test]
    fn missing_timestamp_gets_placeholder_label() {
        let s = sample_from_payload(br#"{"name": "A100", "memory_used": 1073741824}"#).unwrap();
        assert_eq!(s.timestamp, 0.0);
        assert_eq!(s.time_label, NO_TIME_LABEL);
        let s = sample_from_payload(br#"{"timestamp": null, "Utilization": 3}"#).unwrap();
        assert_eq!(s.time_label, NO_TIME_LABEL);
    }

    #[test]
    fn whole_float_byte_counts_are_accepted() {
        let s = sample_from_payload(
            br#"{"MemoryUsed": 8589934592.0, "MemoryTotal": 17179869184.0, "MemoryFree": 0.0}"#,
        )
        .unwrap();
        assert_eq!(s.memory_used_bytes, 8_589_934_592);
        assert_eq!(s.memory_label(), "8.00GB / 16.00GB");
        assert_eq!(s.memory_free_bytes, Some(0));
        assert!(matches!(
            parse_frame(br#"{"MemoryUsed": 1.5}"#),
            Err(ParseError::InvalidField(_))
        ));
        assert!(matches!(
            parse_frame(br#"{"MemoryTotal": -1024}"#),
            Err(ParseError::InvalidField(_))
        ));
        assert_eq!(
            sample_from_payload(br#"{"MemoryUsed": null, "Name": "x"}"#)
                .unwrap()
                .memory_used_bytes,
            0
        );
    }

    #[test]
    fn null_and_empty_name_become_unknown() {
        assert_eq!(
            sample_from_payload(br#"{"Name": null, "Temperature": 50}"#)
                .unwrap()
                .name,
            UNKNOWN_NAME
        );
        assert_eq!(
            sample_from_payload(br#"{"Name": ""}"#).unwrap().name,
            UNKNOWN_NAME
        );
    }

    #[test]
    fn used_above_total_passes_through() {
        let s = sample_from_payload(br#"{"MemoryUsed": 2147483648, "MemoryTotal": 1073741824}"#)
            .unwrap();
        assert_eq!(s.memory_used_gib, 2.0);
        assert_eq!(s.memory_total_gib, 1.0);
        assert_eq!(s.memory_ratio(), 1.0);
    }

    #[test]
    fn snake_case_aliases_and_power() {
        let s = sample_from_payload(
            br#"{"name": "A100", "memory_used": 1073741824, "power_usage": 250000, "index": 1}"#,
        )
        .unwrap();
        assert_eq!(s.name, "A100");
        assert_eq!(s.memory_used_gib, 1.0);
        assert_eq!(s.power_w, Some(250.0));
        assert_eq!(s.index, Some(1));
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(
            parse_frame(b"not json"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_frame(&[0xff, 0xfe]),
            Err(ParseError::Malformed(_))
        ));
        assert_eq!(parse_frame(b"[1,2,3]").unwrap_err(), ParseError::NotAnObject);
        assert_eq!(
            parse_frame(br#"{"hello": 1}"#).unwrap_err(),
            ParseError::MissingFields
        );
        assert!(matches!(
            parse_frame(br#"{"MemoryUsed": "lots"}"#),
            Err(ParseError::InvalidField(_))
        ));
        assert!(matches!(
            parse_frame(br#"{"ProcessCount": -1}"#),
            Err(ParseError::InvalidField(_))
        ));
    }

    #[test]
    fn time_label_shape() {
        let label = time_label(1_700_000_000.25);
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
        assert_eq!(time_label(f64::NAN), NO_TIME_LABEL);
        assert_eq!(time_label(f64::MAX), NO_TIME_LABEL);
    }
}
