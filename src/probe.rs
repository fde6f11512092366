use std::time::Duration;

use ::time::{format_description::well_known, OffsetDateTime};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::service;
use crate::types::{ProbeOutcome, ScanTarget};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(200);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(300);

/// Payload written to an open port before reading its banner.
pub const BANNER_REQUEST: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Upper bound on bytes consumed while looking for the first banner line.
const MAX_BANNER_BYTES: u64 = 1024;

/// One bounded attempt against one target.
///
/// `None` means closed, filtered, unreachable or unresolvable. Implementations
/// must not retry and must release every resource before returning.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: ScanTarget) -> Option<ProbeOutcome>;
}

#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub grab_banner: bool,
    /// Print each open port to stdout as soon as it is found.
    pub live_output: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            grab_banner: false,
            live_output: false,
        }
    }
}

/// Real TCP connect probe.
#[derive(Debug, Clone, Default)]
pub struct TcpProbe {
    config: ProbeConfig,
}

impl TcpProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, target: ScanTarget) -> Option<ProbeOutcome> {
        let outcome = probe_tcp(
            &target.host,
            target.port,
            self.config.connect_timeout,
            self.config.read_timeout,
            self.config.grab_banner,
        )
        .await?;
        if self.config.live_output {
            println!("{outcome}");
        }
        Some(outcome)
    }
}

/// Connect to `host:port` within `connect_timeout`, optionally grab a banner.
///
/// Resolution happens inside the connect timeout. The socket is dropped before
/// this returns on every path.
pub async fn probe_tcp(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    grab_banner: bool,
) -> Option<ProbeOutcome> {
    let start = Instant::now();
    let mut stream = match time::timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            trace!(host, port, error = %e, "connect failed");
            return None;
        }
        Err(_) => {
            trace!(host, port, "connect timed out");
            return None;
        }
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    let banner = if grab_banner {
        read_banner(&mut stream, read_timeout).await
    } else {
        String::new()
    };
    let _ = stream.shutdown().await;
    drop(stream);

    debug!(host, port, latency_ms, "open");
    Some(ProbeOutcome {
        target: ScanTarget::new(host, port),
        open: true,
        service: service::classify(port).to_string(),
        banner,
        latency_ms,
        timestamp: now_iso_like(),
    })
}

/// Send the banner request and read at most one line, bounded by `read_timeout`.
/// Silence, errors and blank lines all yield an empty string.
async fn read_banner(stream: &mut TcpStream, read_timeout: Duration) -> String {
    let exchange = async move {
        stream.write_all(BANNER_REQUEST).await?;
        stream.flush().await?;
        let mut reader = BufReader::new(stream.take(MAX_BANNER_BYTES));
        let mut buf = Vec::new();
        reader.read_until(b'\n', &mut buf).await?;
        Ok::<_, std::io::Error>(buf)
    };
    match time::timeout(read_timeout, exchange).await {
        Ok(Ok(buf)) => String::from_utf8_lossy(&buf).trim().to_string(),
        Ok(Err(e)) => {
            trace!(error = %e, "banner read failed");
            String::new()
        }
        Err(_) => String::new(),
    }
}

/// RFC 3339 UTC timestamp for the moment an open port was confirmed.
fn now_iso_like() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
