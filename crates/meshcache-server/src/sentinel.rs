//! Liveness probing and failure broadcast.
//!
//! One probe task per peer issues `GET {peer}{base_path}` on a fixed
//! interval. A peer moves Unknown/Alive -> Suspect on the first failed
//! probe and Suspect -> Dead on the second consecutive failure; any success
//! returns it to Alive, so a single flap never demotes. A dead peer's probe
//! task emits one failure event and terminates, and the peer is never
//! probed again. Re-admission of a recovered peer is an operational action,
//! not something the sentinel does.
//!
//! A drain task broadcasts each failure event as `PUT {peer}/sentinel` to
//! every peer still believed alive. Delivery is best-effort: failures are
//! logged and never re-queued.

use crate::wire::FailureNotice;
use chrono::Utc;
use meshcache_core::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Consecutive probe failures after which a peer is declared dead.
pub const DEATH_THRESHOLD: u32 = 2;

/// Liveness of one peer, from this sentinel's viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerHealth {
    /// Never probed successfully.
    Unknown,
    /// Last probe succeeded.
    Alive,
    /// The given number of consecutive probes failed.
    Suspect(u32),
    /// Declared dead; no longer probed.
    Dead,
}

/// Probe tunables.
#[derive(Debug, Clone)]
pub struct SentinelOptions {
    /// Probe cadence.
    pub probe_interval: Duration,
    /// Per-probe deadline.
    pub probe_timeout: Duration,
    /// Health path prefix on the probed peers.
    pub base_path: String,
}

impl Default for SentinelOptions {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(3),
            base_path: "/_mesh".to_owned(),
        }
    }
}

struct SentinelInner {
    name: String,
    options: SentinelOptions,
    peers: Vec<String>,
    status: Mutex<HashMap<String, PeerHealth>>,
    http: reqwest::Client,
}

/// Probes a fixed peer set and broadcasts confirmed failures.
#[derive(Clone)]
pub struct Sentinel {
    inner: Arc<SentinelInner>,
}

impl Sentinel {
    /// Creates a sentinel identified as `name` watching `peers`.
    ///
    /// # Errors
    ///
    /// `Internal` if the probe HTTP client cannot be constructed.
    pub fn new(
        name: impl Into<String>,
        peers: Vec<String>,
        options: SentinelOptions,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.probe_timeout)
            .build()
            .map_err(|e| Error::Internal(format!("probe client: {e}")))?;
        let status = peers
            .iter()
            .map(|p| (p.clone(), PeerHealth::Unknown))
            .collect();
        Ok(Self {
            inner: Arc::new(SentinelInner {
                name: name.into(),
                options,
                peers,
                status: Mutex::new(status),
                http,
            }),
        })
    }

    /// Starts one probe task per peer plus the failure drain task.
    ///
    /// Returned handles can be used to shut the sentinel down; dropping
    /// them leaves the tasks running detached.
    pub fn spawn(&self) -> Vec<JoinHandle<()>> {
        let (tx, rx) = mpsc::channel(self.inner.peers.len().max(1) * 3);

        let mut handles = Vec::with_capacity(self.inner.peers.len() + 1);
        for peer in self.inner.peers.clone() {
            let inner = Arc::clone(&self.inner);
            let tx = tx.clone();
            handles.push(tokio::spawn(probe_peer(inner, peer, tx)));
        }
        drop(tx);

        let inner = Arc::clone(&self.inner);
        handles.push(tokio::spawn(drain_failures(inner, rx)));
        handles
    }

    /// This sentinel's view of one peer.
    #[must_use]
    pub fn health(&self, peer: &str) -> Option<PeerHealth> {
        self.inner.status.lock().get(peer).copied()
    }

    /// Peers whose last probe succeeded.
    #[must_use]
    pub fn alive_peers(&self) -> Vec<String> {
        let mut alive: Vec<String> = self
            .inner
            .status
            .lock()
            .iter()
            .filter(|(_, health)| **health == PeerHealth::Alive)
            .map(|(peer, _)| peer.clone())
            .collect();
        alive.sort();
        alive
    }
}

impl std::fmt::Debug for Sentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sentinel")
            .field("name", &self.inner.name)
            .field("peers", &self.inner.peers.len())
            .finish_non_exhaustive()
    }
}

/// Probes one peer until it is declared dead, then emits a single failure
/// event and terminates.
async fn probe_peer(inner: Arc<SentinelInner>, peer: String, tx: mpsc::Sender<FailureNotice>) {
    let mut ticker = tokio::time::interval(inner.options.probe_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let url = format!("{}{}", peer.trim_end_matches('/'), inner.options.base_path);

    loop {
        ticker.tick().await;
        let healthy = match inner.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        };

        let declared_dead = {
            let mut status = inner.status.lock();
            let entry = status.entry(peer.clone()).or_insert(PeerHealth::Unknown);
            if healthy {
                *entry = PeerHealth::Alive;
                false
            } else {
                let failures = match *entry {
                    PeerHealth::Suspect(n) => n + 1,
                    _ => 1,
                };
                if failures >= DEATH_THRESHOLD {
                    *entry = PeerHealth::Dead;
                    true
                } else {
                    *entry = PeerHealth::Suspect(failures);
                    false
                }
            }
        };

        if declared_dead {
            tracing::warn!(sentinel = %inner.name, peer = %peer, "peer declared dead");
            let notice = FailureNotice {
                detected_time: Utc::now(),
                sentinel_name: inner.name.clone(),
                peer_name: peer.clone(),
            };
            if tx.send(notice).await.is_err() {
                tracing::warn!(peer = %peer, "failure channel closed, notice dropped");
            }
            return;
        }
    }
}

/// Drains failure events and fans each one out to the peers still alive.
async fn drain_failures(inner: Arc<SentinelInner>, mut rx: mpsc::Receiver<FailureNotice>) {
    while let Some(notice) = rx.recv().await {
        tracing::warn!(sentinel = %inner.name, peer = %notice.peer_name, "handling failed peer");
        let recipients: Vec<String> = {
            inner
                .status
                .lock()
                .iter()
                .filter(|(_, health)| **health == PeerHealth::Alive)
                .map(|(peer, _)| peer.clone())
                .collect()
        };
        for peer in recipients {
            let inner = Arc::clone(&inner);
            let notice = notice.clone();
            tokio::spawn(notify_peer(inner, peer, notice));
        }
    }
}

/// Delivers one failure notice to one peer. Best-effort.
async fn notify_peer(inner: Arc<SentinelInner>, peer: String, notice: FailureNotice) {
    let url = format!("{}/sentinel", peer.trim_end_matches('/'));
    match inner.http.put(&url).json(&notice).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!(peer = %peer, failed = %notice.peer_name, "failure notice delivered");
        }
        Ok(response) => {
            tracing::warn!(peer = %peer, status = %response.status(), "failure notice rejected");
        }
        Err(err) => {
            tracing::warn!(peer = %peer, error = %err, "failure notice delivery failed");
        }
    }
}
