//! True-random dice backed by random.org.
//!
//! Decimal fractions are fetched in batches and buffered. When the buffer
//! drops below the low-water mark a single background refill is spawned;
//! rolls never wait for the network and fall back to the local RNG when
//! the buffer is empty.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::types::TrueRandomConfig;
use crate::dice::source::{Dice, LocalDice};

/// Upper bound random.org accepts for one request.
const MAX_BATCH: u32 = 10_000;

/// Buffered true-random dice.
#[derive(Clone)]
pub struct EntropyPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    buffer: Mutex<VecDeque<f64>>,
    refilling: AtomicBool,
    client: reqwest::Client,
    url: String,
    batch_size: u32,
    low_water: usize,
    timeout: Duration,
    fallback: LocalDice,
}

impl EntropyPool {
    /// Create an empty pool. Call [`EntropyPool::refill`] to prefill it.
    pub fn new(config: &TrueRandomConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                buffer: Mutex::new(VecDeque::new()),
                refilling: AtomicBool::new(false),
                client: reqwest::Client::new(),
                url: config.url.clone(),
                batch_size: config.batch_size.clamp(1, MAX_BATCH),
                low_water: config.low_water as usize,
                timeout: Duration::from_secs(config.timeout_secs),
                fallback: LocalDice,
            }),
        }
    }

    /// Number of buffered fractions.
    pub fn len(&self) -> usize {
        self.inner.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Append fractions to the buffer, ignoring values outside `[0, 1)`.
    pub fn push_fractions(&self, values: impl IntoIterator<Item = f64>) -> usize {
        let Ok(mut buffer) = self.inner.buffer.lock() else {
            return 0;
        };
        let before = buffer.len();
        buffer.extend(values.into_iter().filter(|v| (0.0..1.0).contains(v)));
        buffer.len() - before
    }

    fn take(&self) -> Option<f64> {
        self.inner.buffer.lock().ok()?.pop_front()
    }

    /// Fetch one batch from the service and append it to the buffer.
    pub async fn refill(&self) -> Result<usize> {
        let num = self.inner.batch_size.to_string();
        let request = self.inner.client.get(&self.inner.url).query(&[
            ("num", num.as_str()),
            ("dec", "10"),
            ("col", "1"),
            ("format", "plain"),
            ("rnd", "new"),
        ]);

        let response = timeout(self.inner.timeout, request.send())
            .await
            .map_err(|_| anyhow!("request timed out after {:?}", self.inner.timeout))?
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("service returned status {}", response.status()));
        }

        let body = timeout(self.inner.timeout, response.text())
            .await
            .map_err(|_| anyhow!("reading response timed out"))?
            .map_err(|e| anyhow!("failed to read response: {}", e))?;

        let added = self.push_fractions(parse_fractions(&body));
        debug!("Entropy pool refilled with {} values ({} buffered)", added, self.len());
        Ok(added)
    }

    /// Spawn a background refill if the buffer is low and none is running.
    fn maybe_refill(&self) {
        if self.len() < self.inner.low_water {
            self.spawn_refill();
        }
    }

    /// Spawn a background refill unless one is already running.
    fn spawn_refill(&self) {
        if self.inner.refilling.swap(true, Ordering::SeqCst) {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.inner.refilling.store(false, Ordering::SeqCst);
            return;
        };

        let pool = self.clone();
        handle.spawn(async move {
            if let Err(e) = pool.refill().await {
                warn!("True-random refill failed, using local RNG meanwhile: {}", e);
            }
            pool.inner.refilling.store(false, Ordering::SeqCst);
        });
    }
}

impl Dice for EntropyPool {
    fn roll(&self, faces: u32) -> u32 {
        let faces = faces.max(1);
        let value = match self.take() {
            Some(fraction) => fraction_to_face(fraction, faces),
            None => {
                debug!("Entropy pool empty, falling back to local RNG");
                self.inner.fallback.roll(faces)
            }
        };
        self.maybe_refill();
        value
    }
}

/// Map a fraction in `[0, 1)` onto `1..=faces`.
pub fn fraction_to_face(fraction: f64, faces: u32) -> u32 {
    let face = (fraction * f64::from(faces)).floor() as u32 + 1;
    face.clamp(1, faces.max(1))
}

/// Parse the plain-text response: one decimal fraction per line.
pub fn parse_fractions(body: &str) -> Vec<f64> {
    body.lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .collect()
}

/// Build the pool and kick off the first fill without blocking startup.
pub fn start(config: &TrueRandomConfig) -> EntropyPool {
    let pool = EntropyPool::new(config);
    info!(
        "True-random dice enabled ({} per batch, refill below {})",
        pool.inner.batch_size, pool.inner.low_water
    );
    pool.spawn_refill();
    pool
}
