//! Per-host load accounting.
//!
//! # Responsibilities
//! - Tally calls per host for one selection strategy
//! - Answer busy / all-busy questions against a threshold
//! - Offer an atomic increment-and-check for concurrent selectors
//!
//! # Design Decisions
//! - One counter per strategy, never shared
//! - Per-host locking through `DashMap` shards; no lock spans services
//! - Monotonic by default; an optional window lets hosts regain capacity

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::load_balancer::host::Host;

#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    window_start: Instant,
}

impl Tally {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Roll the window over if it has elapsed.
    fn refresh(&mut self, window: Option<Duration>, now: Instant) {
        if let Some(window) = window {
            if now.duration_since(self.window_start) >= window {
                self.count = 0;
                self.window_start = now;
            }
        }
    }

    fn current(&self, window: Option<Duration>, now: Instant) -> u64 {
        match window {
            Some(window) if now.duration_since(self.window_start) >= window => 0,
            _ => self.count,
        }
    }
}

/// Call tally per host.
#[derive(Debug, Default)]
pub struct LoadCounter {
    tallies: DashMap<Host, Tally>,
    window: Option<Duration>,
}

impl LoadCounter {
    /// A counter that never resets.
    pub fn monotonic() -> Self {
        Self::default()
    }

    /// A counter whose per-host tally resets once `window` has elapsed
    /// since the start of the host's current window.
    pub fn windowed(window: Duration) -> Self {
        Self {
            tallies: DashMap::new(),
            window: Some(window),
        }
    }

    pub fn with_window(window: Option<Duration>) -> Self {
        match window {
            Some(window) => Self::windowed(window),
            None => Self::monotonic(),
        }
    }

    /// Increment the host's tally by one.
    pub fn record_call(&self, host: &Host) {
        let now = Instant::now();
        let mut tally = self
            .tallies
            .entry(host.clone())
            .or_insert_with(|| Tally::new(now));
        tally.refresh(self.window, now);
        tally.count += 1;
    }

    /// Record a call only if the host is not busy. Check and increment
    /// happen under the same entry lock.
    pub fn try_record(&self, host: &Host, threshold: u64) -> bool {
        let now = Instant::now();
        let mut tally = self
            .tallies
            .entry(host.clone())
            .or_insert_with(|| Tally::new(now));
        tally.refresh(self.window, now);
        if tally.count <= threshold {
            tally.count += 1;
            true
        } else {
            false
        }
    }

    /// Current tally, 0 if never recorded.
    pub fn count_of(&self, host: &Host) -> u64 {
        self.tallies
            .get(host)
            .map(|tally| tally.current(self.window, Instant::now()))
            .unwrap_or(0)
    }

    /// True iff `count_of(host) > threshold`.
    pub fn is_busy(&self, host: &Host, threshold: u64) -> bool {
        self.count_of(host) > threshold
    }

    /// True iff every host in `hosts` is busy.
    pub fn all_busy(&self, hosts: &[Host], threshold: u64) -> bool {
        hosts.iter().all(|host| self.is_busy(host, threshold))
    }

    /// Tallies of every host seen so far.
    pub fn snapshot(&self) -> Vec<(Host, u64)> {
        let now = Instant::now();
        let mut entries: Vec<(Host, u64)> = self
            .tallies
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().current(self.window, now)))
            .collect();
        entries.sort();
        entries
    }

    pub fn window(&self) -> Option<Duration> {
        self.window
    }
}
