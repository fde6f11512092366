#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use trustscan::probe::Probe;
use trustscan::service;
use trustscan::types::{ProbeOutcome, ScanTarget};

/// Probe double that never touches the network and records how it was driven.
pub struct RecordingProbe {
    open: HashSet<u16>,
    hold: Duration,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    calls: Mutex<Vec<ScanTarget>>,
}

impl RecordingProbe {
    pub fn new(open: impl IntoIterator<Item = u16>, hold: Duration) -> Self {
        Self {
            open: open.into_iter().collect(),
            hold,
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ScanTarget> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ports_called(&self) -> Vec<u16> {
        self.calls().into_iter().map(|t| t.port).collect()
    }
}

#[async_trait]
impl Probe for RecordingProbe {
    async fn probe(&self, target: ScanTarget) -> Option<ProbeOutcome> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(target.clone());

        if !self.hold.is_zero() {
            tokio::time::sleep(self.hold).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if !self.open.contains(&target.port) {
            return None;
        }
        Some(ProbeOutcome {
            service: service::classify(target.port).to_string(),
            target,
            open: true,
            banner: String::new(),
            latency_ms: 0,
            timestamp: String::new(),
        })
    }
}

/// Loopback listener answering every connection with `reply`.
pub async fn spawn_banner_server(reply: &'static [u8]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut req = [0u8; 128];
                let _ = sock.read(&mut req).await;
                let _ = sock.write_all(reply).await;
            });
        }
    });
    port
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
