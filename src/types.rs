use std::fmt;

use serde::{Deserialize, Serialize};

/// One (host, port) pair scheduled for probing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub host: String,
    pub port: u16,
}

impl ScanTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A target that accepted a connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub target: ScanTarget,
    pub open: bool,
    pub service: String,
    /// Trimmed first response line, empty when nothing was read.
    pub banner: String,
    pub latency_ms: u64,
    pub timestamp: String,
}

impl ProbeOutcome {
    /// `[OPEN] host:port (service) → banner`, the banner part omitted when empty.
    pub fn report_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[OPEN] {} ({})", self.target, self.service)?;
        if !self.banner.is_empty() {
            write!(f, " → {}", self.banner)?;
        }
        Ok(())
    }
}

/// Frozen outcome of one scan invocation.
///
/// Entries are in ascending port order per host for sequential levels; pool
/// levels append in completion order.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ResultSet {
    /// Probes attempted, open or not.
    pub probed: u64,
    pub entries: Vec<ProbeOutcome>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn report_lines(&self) -> Vec<String> {
        self.entries.iter().map(ProbeOutcome::report_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(banner: &str) -> ProbeOutcome {
        ProbeOutcome {
            target: ScanTarget::new("10.0.0.5", 80),
            open: true,
            service: "HTTP".into(),
            banner: banner.into(),
            latency_ms: 3,
            timestamp: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn report_line_without_banner() {
        assert_eq!(outcome("").report_line(), "[OPEN] 10.0.0.5:80 (HTTP)");
    }

    #[test]
    fn report_line_with_banner() {
        assert_eq!(
            outcome("HTTP/1.1 200 OK").report_line(),
            "[OPEN] 10.0.0.5:80 (HTTP) → HTTP/1.1 200 OK"
        );
    }
}
