//! Proxy pool with liveness verification and a one-way blacklist.
//!
//! Endpoints start healthy, move to the blacklist when implicated in a
//! failure, and never come back. Selection is a uniform draw from the
//! healthy list with a periodic reshuffle to break ordering bias.

use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;

const DEFAULT_ECHO_TARGETS: &[&str] = &[
    "http://httpbin.org/ip",
    "http://api.ipify.org",
    "http://icanhazip.com",
];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to read proxy list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Probe targets and timeouts for pool verification.
#[derive(Debug, Clone)]
pub struct ProxyPoolConfig {
    pub echo_targets: Vec<String>,
    pub probe_timeout: Duration,
    pub connect_timeout: Duration,
    /// Every Nth pick reshuffles the healthy list before drawing.
    pub shuffle_interval: u64,
}

impl Default for ProxyPoolConfig {
    fn default() -> Self {
        Self {
            echo_targets: DEFAULT_ECHO_TARGETS
                .iter()
                .map(|target| target.to_string())
                .collect(),
            probe_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            shuffle_interval: 10,
        }
    }
}

/// Counts for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHealthReport {
    pub healthy: usize,
    pub blacklisted: usize,
}

/// Exclusive owner of the endpoint set, split into healthy and blacklisted.
#[derive(Debug)]
pub struct ProxyPool {
    config: ProxyPoolConfig,
    healthy: Vec<String>,
    blacklist: BTreeSet<String>,
    picks: u64,
}

impl ProxyPool {
    pub fn new(config: ProxyPoolConfig) -> Self {
        Self {
            config,
            healthy: Vec::new(),
            blacklist: BTreeSet::new(),
            picks: 0,
        }
    }

    pub fn load<I>(&mut self, endpoints: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for endpoint in endpoints {
            self.add_endpoint(endpoint);
        }
    }

    /// Adds one endpoint to the healthy list. Blacklisted endpoints stay
    /// out; duplicates are ignored.
    pub fn add_endpoint(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        if self.blacklist.contains(&endpoint)
            || self.healthy.iter().any(|known| *known == endpoint)
        {
            return;
        }
        self.healthy.push(endpoint);
    }

    /// Loads a newline-delimited list; blank lines and `#` comments are
    /// skipped. Returns how many endpoints were added.
    pub fn load_str(&mut self, text: &str) -> usize {
        let before = self.healthy.len();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.add_endpoint(line);
        }
        self.healthy.len() - before
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ProxyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProxyError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load_str(&text))
    }

    /// Uniform draw from the healthy list, or None when it is empty.
    pub fn get(&mut self) -> Option<String> {
        if self.healthy.is_empty() {
            return None;
        }
        self.picks += 1;
        let mut rng = rand::thread_rng();
        let interval = self.config.shuffle_interval.max(1);
        if self.picks % interval == 0 {
            self.healthy.shuffle(&mut rng);
        }
        self.healthy.choose(&mut rng).cloned()
    }

    /// One-directional: the endpoint leaves the healthy list and never
    /// returns. Idempotent.
    pub fn mark_bad(&mut self, endpoint: &str) {
        self.healthy.retain(|known| known != endpoint);
        if self.blacklist.insert(endpoint.to_string()) {
            log::info!(
                "proxy blacklisted: {} ({} healthy remain)",
                endpoint,
                self.healthy.len()
            );
        }
    }

    /// Carries a resumed session's blacklist forward.
    pub fn seed_blacklist<I>(&mut self, endpoints: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for endpoint in endpoints {
            let endpoint = endpoint.into();
            self.healthy.retain(|known| *known != endpoint);
            self.blacklist.insert(endpoint);
        }
    }

    pub fn healthy_len(&self) -> usize {
        self.healthy.len()
    }

    pub fn blacklisted_len(&self) -> usize {
        self.blacklist.len()
    }

    /// Blacklist contents in sorted order, for checkpointing.
    pub fn blacklist_snapshot(&self) -> Vec<String> {
        self.blacklist.iter().cloned().collect()
    }

    pub fn health_report(&self) -> PoolHealthReport {
        PoolHealthReport {
            healthy: self.healthy.len(),
            blacklisted: self.blacklist.len(),
        }
    }

    /// Probes every healthy endpoint concurrently against the configured
    /// echo targets. Endpoints that answer at least one probe stay healthy;
    /// the rest are dropped (not blacklisted). Probe failures are logged
    /// and never cancel sibling probes. Returns the surviving count.
    pub async fn verify_all(&mut self) -> usize {
        if self.healthy.is_empty() {
            return 0;
        }
        let targets = self.config.echo_targets.clone();
        let connect_timeout = self.config.connect_timeout;
        let probe_timeout = self.config.probe_timeout;

        let mut probes = JoinSet::new();
        for endpoint in self.healthy.drain(..) {
            let targets = targets.clone();
            probes.spawn(async move {
                let alive =
                    probe_endpoint(&endpoint, &targets, connect_timeout, probe_timeout).await;
                (endpoint, alive)
            });
        }

        let mut verified = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((endpoint, true)) => {
                    log::debug!("proxy verified: {}", endpoint);
                    verified.push(endpoint);
                }
                Ok((endpoint, false)) => {
                    log::warn!("proxy failed verification, dropping: {}", endpoint);
                }
                Err(err) => log::warn!("proxy probe task failed: {}", err),
            }
        }
        self.healthy = verified;
        self.healthy.len()
    }
}

impl Default for ProxyPool {
    fn default() -> Self {
        Self::new(ProxyPoolConfig::default())
    }
}

/// Walks the echo targets through one proxy; alive on the first success.
async fn probe_endpoint(
    endpoint: &str,
    targets: &[String],
    connect_timeout: Duration,
    probe_timeout: Duration,
) -> bool {
    let proxy = match reqwest::Proxy::all(endpoint) {
        Ok(proxy) => proxy,
        Err(err) => {
            log::debug!("unusable proxy endpoint {}: {}", endpoint, err);
            return false;
        }
    };
    let client = match reqwest::Client::builder()
        .proxy(proxy)
        .connect_timeout(connect_timeout)
        .timeout(probe_timeout)
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            log::debug!("probe client build failed for {}: {}", endpoint, err);
            return false;
        }
    };

    for target in targets {
        match client.get(target).send().await {
            Ok(reply) if reply.status().is_success() => return true,
            Ok(reply) => log::debug!(
                "echo target {} answered {} via {}",
                target,
                reply.status(),
                endpoint
            ),
            Err(err) => log::debug!("probe via {} failed: {}", endpoint, err),
        }
    }
    false
}
