//! Presentation-boundary helpers: one-decimal percentages, service classes, plain-text lines.

use crate::history::LogBuffer;
use crate::model::{LogEntry, MonitoringSnapshot, ProcessSample, ServiceStatus, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceClass {
    Active,
    /// Anything other than exactly "active".
    Inactive,
}

impl ServiceClass {
    pub fn of(service: &ServiceStatus) -> Self {
        if service.is_active() {
            ServiceClass::Active
        } else {
            ServiceClass::Inactive
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            ServiceClass::Active => "●",
            ServiceClass::Inactive => "○",
        }
    }
}

pub fn pct(v: f64) -> String {
    format!("{v:.1}%")
}

pub fn truncate_middle(s: &str, max: usize) -> String {
    let n = s.chars().count();
    if n <= max {
        return s.to_string();
    }
    if max <= 3 {
        return "...".into();
    }
    let keep = max - 3;
    let left = keep / 2;
    let right = keep - left;
    let head: String = s.chars().take(left).collect();
    let tail: String = s.chars().skip(n - right).collect();
    format!("{head}...{tail}")
}

pub fn header(host: &str, state: SessionState) -> String {
    if host.is_empty() {
        format!("hostwatch — {state}")
    } else {
        format!("hostwatch — host: {host} | {state}")
    }
}

pub fn gauge_line(snapshot: &MonitoringSnapshot) -> String {
    let g = &snapshot.gauge;
    let mut line = format!("CPU {}  MEM {}", pct(g.cpu_percent), pct(g.memory_percent));
    if !g.is_plausible() {
        line.push_str("  (suspect reading)");
    }
    line
}

pub fn service_line(s: &ServiceStatus) -> String {
    format!("{} {:<24} {}", ServiceClass::of(s).marker(), truncate_middle(&s.name, 24), s.state)
}

pub fn process_line(p: &ProcessSample) -> String {
    format!(
        "{:>8}  {:<28} {:>7} {:>7}",
        p.pid,
        truncate_middle(&p.name, 28),
        pct(p.cpu_percent),
        pct(p.mem_percent)
    )
}

/// Lines for one dashboard snapshot, in delivery order.
pub fn snapshot_lines(snapshot: &MonitoringSnapshot) -> Vec<String> {
    let mut out = vec![gauge_line(snapshot)];
    if !snapshot.services.is_empty() {
        out.push("Services:".into());
        out.extend(snapshot.services.iter().map(|s| format!("  {}", service_line(s))));
    }
    if !snapshot.processes.is_empty() {
        out.push(format!("{:>8}  {:<28} {:>7} {:>7}", "PID", "NAME", "CPU", "MEM"));
        out.extend(snapshot.processes.iter().map(process_line));
    }
    out
}

pub fn log_line(entry: &LogEntry) -> String {
    format!(
        "{} [{}] CPU Usage: {}",
        entry.received_at.format("%H:%M:%S"),
        entry.host,
        pct(entry.cpu_percent)
    )
}

/// Whole bounded log, newest entry first.
pub fn log_lines(buf: &LogBuffer) -> Vec<String> {
    buf.iter().map(log_line).collect()
}
