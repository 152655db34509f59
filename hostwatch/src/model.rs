//! Types that mirror the gateway's JSON schema, plus the client-side views built from them.
//! Numeric fields arrive either as JSON numbers or numeric strings; both are kept at full precision.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer};

/// Credentials for one "start monitoring" action. Consumed by the handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub host: String,
    pub username: String,
    pub secret: String,
}

impl ConnectionRequest {
    pub fn new(host: impl Into<String>, username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }
}

// Keep the secret out of logs.
impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Monitoring,
    Error,
}

impl SessionState {
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::Connecting => "CONNECTING",
            SessionState::Monitoring => "MONITORING",
            SessionState::Error => "ERROR",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceGauge {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl ResourceGauge {
    /// Both values within 0..=100. Out-of-range readings are kept, only flagged.
    pub fn is_plausible(&self) -> bool {
        let ok = |v: f64| (0.0..=100.0).contains(&v);
        ok(self.cpu_percent) && ok(self.memory_percent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    // unknown states are preserved verbatim
    #[serde(rename = "status")]
    pub state: String,
}

impl ServiceStatus {
    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessSample {
    #[serde(deserialize_with = "de_pid")]
    pub pid: u32,
    pub name: String,
    #[serde(rename = "cpu", deserialize_with = "de_number")]
    pub cpu_percent: f64,
    #[serde(rename = "mem", deserialize_with = "de_number")]
    pub mem_percent: f64,
}

/// Full-replace dashboard view of one measurement cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonitoringSnapshot {
    pub gauge: ResourceGauge,
    pub services: Vec<ServiceStatus>,
    // rank order as delivered; never re-sorted client-side
    pub processes: Vec<ProcessSample>,
}

/// Append-only log view: one scalar CPU reading per cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub host: String,
    pub cpu_percent: f64,
    pub received_at: DateTime<Local>,
}

/// Which of the two update shapes a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateShape {
    Log,
    Dashboard,
}

/// Body of a `monitoring` frame, as decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MonitoringUpdate {
    #[serde(default, rename = "ip")]
    pub host: Option<String>,
    #[serde(deserialize_with = "de_number")]
    pub cpu: f64,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub memory: Option<f64>,
    #[serde(default)]
    pub services: Option<Vec<ServiceStatus>>,
    #[serde(default)]
    pub processes: Option<Vec<ProcessSample>>,
}

impl MonitoringUpdate {
    pub fn shape(&self) -> UpdateShape {
        if self.services.is_some() || self.processes.is_some() {
            UpdateShape::Dashboard
        } else {
            UpdateShape::Log
        }
    }

    /// Dashboard view of this cycle. Absent fields become zero/empty; nothing is merged
    /// from earlier snapshots.
    pub fn into_snapshot(self) -> MonitoringSnapshot {
        MonitoringSnapshot {
            gauge: ResourceGauge {
                cpu_percent: self.cpu,
                memory_percent: self.memory.unwrap_or(0.0),
            },
            services: self.services.unwrap_or_default(),
            processes: self.processes.unwrap_or_default(),
        }
    }

    pub fn to_log_entry(&self, fallback_host: &str) -> LogEntry {
        LogEntry {
            host: self
                .host
                .clone()
                .unwrap_or_else(|| fallback_host.to_string()),
            cpu_percent: self.cpu,
            received_at: Local::now(),
        }
    }
}

// ---------- numeric coercion ----------

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(f64),
    Str(String),
}

// "NaN", "inf" and friends parse as f64 but are never valid readings.
fn coerce<E: serde::de::Error>(v: NumOrStr) -> Result<f64, E> {
    let n = match v {
        NumOrStr::Num(n) => n,
        NumOrStr::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::custom(format!("not a number: {s:?}")))?,
    };
    if !n.is_finite() {
        return Err(E::custom(format!("non-finite number: {n}")));
    }
    Ok(n)
}

fn de_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    coerce(NumOrStr::deserialize(d)?)
}

fn de_opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<NumOrStr>::deserialize(d)? {
        Some(v) => coerce(v).map(Some),
        None => Ok(None),
    }
}

fn de_pid<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = coerce::<D::Error>(NumOrStr::deserialize(d)?)?;
    if v.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&v) {
        return Err(serde::de::Error::custom(format!("invalid pid: {v}")));
    }
    Ok(v as u32)
}
