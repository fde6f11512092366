use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::probe::{Probe, TcpProbe};
use crate::results::ResultCollector;
use crate::scheduler::Scheduler;
use crate::types::ResultSet;

/// Scan every host of `config.target` over `config.ports` with real TCP probes.
pub async fn scan(config: &ScanConfig) -> ResultSet {
    scan_with_cancel(config, CancellationToken::new()).await
}

/// Variant that accepts a `CancellationToken` to allow external cancellation.
pub async fn scan_with_cancel(config: &ScanConfig, cancel: CancellationToken) -> ResultSet {
    let probe = Arc::new(TcpProbe::new(config.probe_config()));
    run_scan(config, probe, cancel).await
}

/// Compose the target iterator over one scheduler into a single result set.
///
/// Hosts are visited in ascending order; each host gets the full port range.
/// A cancelled scan returns what was found so far.
pub async fn run_scan(
    config: &ScanConfig,
    probe: Arc<dyn Probe>,
    cancel: CancellationToken,
) -> ResultSet {
    let scheduler = Scheduler::with_cancel(probe, config.scheduler_settings(), cancel.clone());
    let collector = ResultCollector::new();
    let started = Instant::now();

    info!(
        target_spec = %config.target,
        hosts = config.target.host_count(),
        start_port = config.ports.start(),
        end_port = config.ports.end(),
        aggression = %config.aggression,
        "scan started"
    );

    for host in config.target.hosts() {
        if cancel.is_cancelled() {
            break;
        }
        info!(host = %host, "scanning host");
        let before = collector.len().await;
        scheduler
            .run_port_range_into(&host, config.ports, &collector)
            .await;
        let found = collector.len().await - before;
        debug!(host = %host, open = found, "host done");
    }

    let results = collector.freeze().await;
    info!(
        probed = results.probed,
        open = results.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        cancelled = cancel.is_cancelled(),
        "scan finished"
    );
    results
}
