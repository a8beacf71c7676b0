//! Types that mirror the agent's JSON frame, plus the normalized forms the
//! client keeps in memory.

use serde::{de::Error as _, Deserialize, Deserializer};

/// Name used when the producer omits the device name.
pub const UNKNOWN_NAME: &str = "unknown";

/// Label used when a timestamp cannot be rendered.
pub const NO_TIME_LABEL: &str = "--:--:--";

/// One inbound frame as it appears on the wire. Every field is optional;
/// the normalizer decides the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFrame {
    // unix seconds, possibly fractional
    pub timestamp: Option<f64>,
    #[serde(rename = "Name", alias = "name")]
    pub name: Option<String>,
    #[serde(
        rename = "MemoryUsed",
        alias = "memory_used",
        default,
        deserialize_with = "byte_count"
    )]
    pub memory_used: Option<u64>,
    #[serde(
        rename = "MemoryTotal",
        alias = "memory_total",
        default,
        deserialize_with = "byte_count"
    )]
    pub memory_total: Option<u64>,
    #[serde(
        rename = "MemoryFree",
        alias = "memory_free",
        default,
        deserialize_with = "byte_count"
    )]
    pub memory_free: Option<u64>,
    #[serde(rename = "Utilization", alias = "utilization")]
    pub utilization: Option<f64>,
    #[serde(rename = "Temperature", alias = "temperature")]
    pub temperature: Option<f64>,
    #[serde(rename = "ProcessCount", alias = "process_count")]
    pub process_count: Option<u32>,
    // milliwatts
    #[serde(rename = "PowerUsage", alias = "power_usage")]
    pub power_usage: Option<u32>,
    #[serde(rename = "Index", alias = "index")]
    pub index: Option<u32>,
}

/// Byte counts arrive as JSON numbers; some producers emit `8589934592.0`.
/// Whole non-negative floats are accepted, anything else is a field error.
fn byte_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Float(f64),
    }

    match Option::<Number>::deserialize(d)? {
        None => Ok(None),
        Some(Number::Int(n)) => Ok(Some(n)),
        Some(Number::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 => {
            Ok(Some(f as u64))
        }
        Some(Number::Float(f)) => Err(D::Error::custom(format!(
            "expected a whole non-negative byte count, got {f}"
        ))),
    }
}

/// Keys that mark a JSON object as a telemetry frame.
pub const FRAME_KEYS: &[&str] = &[
    "timestamp",
    "Name",
    "name",
    "MemoryUsed",
    "memory_used",
    "MemoryTotal",
    "memory_total",
    "MemoryFree",
    "memory_free",
    "Utilization",
    "utilization",
    "Temperature",
    "temperature",
    "ProcessCount",
    "process_count",
    "PowerUsage",
    "power_usage",
    "Index",
    "index",
];

/// Display-ready form of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub time_label: String,
    pub name: String,
    pub index: Option<u32>,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub memory_free_bytes: Option<u64>,
    pub memory_used_gib: f64,
    pub memory_total_gib: f64,
    pub utilization_pct: f64,
    pub temperature_c: f64,
    pub process_count: u32,
    pub power_w: Option<f64>,
}

impl Sample {
    /// The state shown before the first frame arrives.
    pub fn empty() -> Self {
        Self {
            timestamp: 0.0,
            time_label: NO_TIME_LABEL.to_string(),
            name: UNKNOWN_NAME.to_string(),
            index: None,
            memory_used_bytes: 0,
            memory_total_bytes: 0,
            memory_free_bytes: None,
            memory_used_gib: 0.0,
            memory_total_gib: 0.0,
            utilization_pct: 0.0,
            temperature_c: 0.0,
            process_count: 0,
            power_w: None,
        }
    }

    /// `8.00GB / 16.00GB`
    pub fn memory_label(&self) -> String {
        format!(
            "{:.2}GB / {:.2}GB",
            self.memory_used_gib, self.memory_total_gib
        )
    }

    /// Used/total ratio clamped to 0..=1 for gauges. Producers may report
    /// used > total; the raw values are kept as-is elsewhere.
    pub fn memory_ratio(&self) -> f64 {
        if self.memory_total_bytes == 0 {
            return 0.0;
        }
        (self.memory_used_bytes as f64 / self.memory_total_bytes as f64).clamp(0.0, 1.0)
    }

    pub fn to_point(&self) -> WindowPoint {
        WindowPoint {
            seq: 0,
            ts: self.timestamp,
            time_label: self.time_label.clone(),
            memory_used_gb: self.memory_used_gib,
            utilization_pct: self.utilization_pct,
            temperature_c: self.temperature_c,
        }
    }
}

impl Default for Sample {
    fn default() -> Self {
        Self::empty()
    }
}

/// One chart point. `ts` is the producer's timestamp (0 when absent);
/// `seq` is stamped by the window on push and always advances, so it is the
/// chart's x key. `time_label` is for axes only.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPoint {
    pub seq: u64,
    pub ts: f64,
    pub time_label: String,
    pub memory_used_gb: f64,
    pub utilization_pct: f64,
    pub temperature_c: f64,
}
