use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::aggression::{AggressionLevel, ScheduleMode};
use crate::ports::PortRange;
use crate::probe::Probe;
use crate::results::ResultCollector;
use crate::types::{ResultSet, ScanTarget};

/// Upper bound on waiting for one host's pool tasks to drain.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub level: AggressionLevel,
    pub join_timeout: Duration,
    /// Maximum extra random pause after each sequential probe.
    pub jitter: Duration,
    /// Seed for the jitter source; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            level: AggressionLevel::default(),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            jitter: Duration::ZERO,
            seed: None,
        }
    }
}

/// Random pause source shared by one scheduler.
#[derive(Debug)]
struct Jitter {
    max_ms: u64,
    rng: Mutex<StdRng>,
}

impl Jitter {
    fn new(max: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            max_ms: max.as_millis() as u64,
            rng: Mutex::new(rng),
        }
    }

    fn next(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        Duration::from_millis(rng.random_range(0..=self.max_ms))
    }
}

/// Drives probes for one host at a time according to an aggression level.
///
/// The worker pool is created once and reused for every host handed to this
/// scheduler, so a range scan never holds more than `level.concurrency()`
/// probes in flight.
pub struct Scheduler {
    probe: Arc<dyn Probe>,
    level: AggressionLevel,
    pool: Arc<Semaphore>,
    join_timeout: Duration,
    jitter: Jitter,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(probe: Arc<dyn Probe>, settings: SchedulerSettings) -> Self {
        Self::with_cancel(probe, settings, CancellationToken::new())
    }

    pub fn with_cancel(
        probe: Arc<dyn Probe>,
        settings: SchedulerSettings,
        cancel: CancellationToken,
    ) -> Self {
        let level = settings.level;
        Self {
            probe,
            level,
            pool: Arc::new(Semaphore::new(level.concurrency())),
            join_timeout: settings.join_timeout,
            jitter: Jitter::new(settings.jitter, settings.seed),
            cancel,
        }
    }

    pub fn level(&self) -> AggressionLevel {
        self.level
    }

    /// Probe every port of `ports` on `host` into a fresh result set.
    pub async fn run_port_range(&self, host: &str, ports: PortRange) -> ResultSet {
        let collector = ResultCollector::new();
        self.run_port_range_into(host, ports, &collector).await;
        collector.freeze().await
    }

    /// Probe every port of `ports` on `host`, appending open ones to `collector`.
    pub async fn run_port_range_into(
        &self,
        host: &str,
        ports: PortRange,
        collector: &ResultCollector,
    ) {
        match self.level.mode() {
            ScheduleMode::Sequential => self.run_sequential(host, ports, collector).await,
            ScheduleMode::Pool => self.run_pool(host, ports, collector).await,
        }
    }

    async fn run_sequential(&self, host: &str, ports: PortRange, collector: &ResultCollector) {
        let delay = self.level.delay();
        let last = ports.end();
        for port in ports {
            if self.cancel.is_cancelled() {
                debug!(host, port, "scan cancelled");
                break;
            }
            collector.record_probe();
            if let Some(outcome) = self.probe.probe(ScanTarget::new(host, port)).await {
                collector.append(outcome).await;
            }
            if port == last {
                break;
            }
            let pause = delay + self.jitter.next();
            if !pause.is_zero() {
                tokio::select! {
                    _ = time::sleep(pause) => {}
                    _ = self.cancel.cancelled() => {}
                }
            }
        }
    }

    /// Submit one task per port to the pool and wait for all of them.
    ///
    /// `join_timeout` bounds the whole run, submission included. When it
    /// expires the remaining tasks are aborted and awaited, so nothing appends
    /// to `collector` after this returns.
    async fn run_pool(&self, host: &str, ports: PortRange, collector: &ResultCollector) {
        let deadline = Instant::now() + self.join_timeout;
        let mut set = JoinSet::new();

        let completed = time::timeout_at(deadline, async {
            for port in ports {
                if self.cancel.is_cancelled() {
                    debug!(host, port, "scan cancelled");
                    break;
                }
                let permit = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break,
                    p = self.pool.clone().acquire_owned() => p,
                };
                let Ok(permit) = permit else {
                    break;
                };
                let probe = self.probe.clone();
                let collector = collector.clone();
                let target = ScanTarget::new(host, port);

                set.spawn(async move {
                    let _permit = permit; // held until the probe finishes
                    collector.record_probe();
                    if let Some(outcome) = probe.probe(target).await {
                        collector.append(outcome).await;
                    }
                });
            }

            while let Some(res) = set.join_next().await {
                if let Err(e) = res {
                    warn!(host, error = %e, "probe task failed");
                }
            }
        })
        .await;

        if completed.is_err() {
            warn!(
                host,
                timeout_secs = self.join_timeout.as_secs(),
                outstanding = set.len(),
                "pool join timed out; abandoning outstanding probes"
            );
            set.abort_all();
            while set.join_next().await.is_some() {}
        }
    }
}
