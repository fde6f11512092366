use std::time::Duration;

use crate::aggression::AggressionLevel;
use crate::ports::PortRange;
use crate::probe::{ProbeConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};
use crate::scheduler::{SchedulerSettings, DEFAULT_JOIN_TIMEOUT};
use crate::targets::TargetSpec;

/// Everything the scanning core needs for one run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: TargetSpec,
    pub ports: PortRange,
    pub grab_banner: bool,
    pub aggression: AggressionLevel,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Safety net for pool-mode joins, not a normal exit path.
    pub join_timeout: Duration,
    pub jitter: Duration,
    pub seed: Option<u64>,
    pub live_output: bool,
}

impl ScanConfig {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            target,
            ports: PortRange::default(),
            grab_banner: false,
            aggression: AggressionLevel::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            jitter: Duration::ZERO,
            seed: None,
            live_output: false,
        }
    }

    pub fn ports(mut self, ports: PortRange) -> Self {
        self.ports = ports;
        self
    }

    pub fn grab_banner(mut self, on: bool) -> Self {
        self.grab_banner = on;
        self
    }

    pub fn aggression(mut self, level: AggressionLevel) -> Self {
        self.aggression = level;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn jitter(mut self, max: Duration, seed: Option<u64>) -> Self {
        self.jitter = max;
        self.seed = seed;
        self
    }

    pub fn live_output(mut self, on: bool) -> Self {
        self.live_output = on;
        self
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            grab_banner: self.grab_banner,
            live_output: self.live_output,
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            level: self.aggression,
            join_timeout: self.join_timeout,
            jitter: self.jitter,
            seed: self.seed,
        }
    }

    /// Number of probes this run will attempt.
    pub fn total_probes(&self) -> u64 {
        self.target.host_count() as u64 * self.ports.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_surface() {
        let cfg = ScanConfig::new(TargetSpec::single("localhost"));
        assert_eq!((cfg.ports.start(), cfg.ports.end()), (1, 1024));
        assert_eq!(cfg.aggression.value(), 1);
        assert!(!cfg.grab_banner);
        assert_eq!(cfg.connect_timeout, Duration::from_millis(200));
        assert_eq!(cfg.read_timeout, Duration::from_millis(300));
        assert_eq!(cfg.join_timeout, Duration::from_secs(3600));
        assert_eq!(cfg.total_probes(), 1024);
    }

    #[test]
    fn builders_flow_into_derived_settings() {
        let cfg = ScanConfig::new(TargetSpec::parse_range("10.0.0.1-10.0.0.4").unwrap())
            .ports(PortRange::new(20, 29).unwrap())
            .grab_banner(true)
            .aggression(AggressionLevel::clamped(4))
            .join_timeout(Duration::from_secs(5))
            .jitter(Duration::from_millis(50), Some(7));

        assert_eq!(cfg.total_probes(), 40);
        let p = cfg.probe_config();
        assert!(p.grab_banner);
        let s = cfg.scheduler_settings();
        assert_eq!(s.level.concurrency(), 50);
        assert_eq!(s.join_timeout, Duration::from_secs(5));
        assert_eq!(s.seed, Some(7));
    }
}
