//! Threshold-aware host selection.
//!
//! # Responsibilities
//! - Combine a `LoadBalancer` (which host is next) with a `LoadCounter`
//!   (is that host saturated) for one strategy
//! - Detect pool exhaustion deterministically
//! - Turn "no host this round" into a single outcome for callers

use std::sync::Arc;

use crate::config::schema::BalancingConfig;
use crate::error::ProxyError;
use crate::load_balancer::counter::LoadCounter;
use crate::load_balancer::host::Host;
use crate::load_balancer::pool::HostRegistry;
use crate::load_balancer::random::RandomPick;
use crate::load_balancer::round_robin::RoundRobin;
use crate::load_balancer::{LoadBalancer, Strategy};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Outcome of a single selection round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A host below threshold was found and its call recorded.
    Selected(Host),
    /// The candidate was busy but a sibling is not; ask again.
    Retry,
}

/// Selection state for one strategy: balancer, counter and threshold.
#[derive(Debug)]
pub struct Selector {
    strategy: Strategy,
    balancer: Box<dyn LoadBalancer>,
    counter: LoadCounter,
    threshold: u64,
    registry: Arc<HostRegistry>,
    max_rounds: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
}

impl Selector {
    /// Build the selector for `strategy` with the configured threshold.
    pub fn for_strategy(
        strategy: Strategy,
        registry: Arc<HostRegistry>,
        config: &BalancingConfig,
    ) -> Self {
        let balancer: Box<dyn LoadBalancer> = match strategy {
            Strategy::RoundRobin => Box::new(RoundRobin::new(&registry)),
            Strategy::Random => Box::new(RandomPick::new()),
        };
        Self::new(strategy, balancer, registry, config)
    }

    /// Build a selector around an explicit balancer.
    pub fn new(
        strategy: Strategy,
        balancer: Box<dyn LoadBalancer>,
        registry: Arc<HostRegistry>,
        config: &BalancingConfig,
    ) -> Self {
        let threshold = match strategy {
            Strategy::RoundRobin => config.round_robin_threshold,
            Strategy::Random => config.random_threshold,
        };
        Self {
            strategy,
            balancer,
            counter: LoadCounter::with_window(config.counter_window()),
            threshold,
            registry,
            max_rounds: config.max_selection_rounds,
            backoff_base_ms: config.backoff_base_ms,
            backoff_max_ms: config.backoff_max_ms,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn counter(&self) -> &LoadCounter {
        &self.counter
    }

    /// Run one selection round for `service`.
    ///
    /// Advances the balancer once. Returns the candidate if it is at or
    /// below threshold, `PoolExhausted` if every host is busy, otherwise
    /// `Selection::Retry`.
    pub fn try_next(&self, service: &str) -> Result<Selection, ProxyError> {
        let hosts = self.registry.hosts_for(service)?;
        let index = self
            .balancer
            .pick(service, hosts)
            .ok_or_else(|| ProxyError::UnknownService(service.to_string()))?;
        let host = &hosts[index];

        if self.counter.try_record(host, self.threshold) {
            tracing::debug!(
                strategy = %self.strategy,
                host = %host,
                count = self.counter.count_of(host),
                "Host selected"
            );
            metrics::record_selection(self.strategy.as_str(), service, "selected");
            return Ok(Selection::Selected(host.clone()));
        }

        if self.counter.all_busy(hosts, self.threshold) {
            tracing::warn!(
                strategy = %self.strategy,
                service = %service,
                threshold = self.threshold,
                "All hosts are busy, scale up"
            );
            metrics::record_selection(self.strategy.as_str(), service, "exhausted");
            return Err(ProxyError::PoolExhausted(service.to_string()));
        }

        tracing::trace!(strategy = %self.strategy, host = %host, "Host busy, trying again");
        Ok(Selection::Retry)
    }

    /// Select a host for `service`, looping over rounds internally.
    ///
    /// Always yields a host or a terminal error: after `max_selection_rounds`
    /// misses it sweeps the pool in order once and reports `PoolExhausted`
    /// if nothing admits a call.
    pub async fn next(&self, service: &str) -> Result<Host, ProxyError> {
        let pool_size = self.registry.hosts_for(service)?.len();

        for round in 1..=self.max_rounds {
            if let Selection::Selected(host) = self.try_next(service)? {
                return Ok(host);
            }
            // Back off after every full pass over the pool.
            if round as usize % pool_size == 0 {
                let passes = (round as usize / pool_size) as u32;
                let delay = calculate_backoff(passes, self.backoff_base_ms, self.backoff_max_ms);
                tokio::time::sleep(delay).await;
            } else {
                tokio::task::yield_now().await;
            }
        }

        self.sweep(service)
    }

    /// One ordered pass over the pool starting at the balancer's next pick.
    fn sweep(&self, service: &str) -> Result<Host, ProxyError> {
        let hosts = self.registry.hosts_for(service)?;
        let start = self.balancer.pick(service, hosts).unwrap_or(0);

        for offset in 0..hosts.len() {
            let host = &hosts[(start + offset) % hosts.len()];
            if self.counter.try_record(host, self.threshold) {
                metrics::record_selection(self.strategy.as_str(), service, "selected");
                return Ok(host.clone());
            }
        }

        tracing::warn!(strategy = %self.strategy, service = %service, "Selection sweep found no free host");
        metrics::record_selection(self.strategy.as_str(), service, "exhausted");
        Err(ProxyError::PoolExhausted(service.to_string()))
    }
}

/// Round-robin and random selectors over one registry.
#[derive(Debug)]
pub struct Selectors {
    round_robin: Selector,
    random: Selector,
}

impl Selectors {
    pub fn new(registry: Arc<HostRegistry>, config: &BalancingConfig) -> Self {
        Self {
            round_robin: Selector::for_strategy(Strategy::RoundRobin, registry.clone(), config),
            random: Selector::for_strategy(Strategy::Random, registry, config),
        }
    }

    /// The selector backing `strategy`.
    pub fn get(&self, strategy: Strategy) -> &Selector {
        match strategy {
            Strategy::RoundRobin => &self.round_robin,
            Strategy::Random => &self.random,
        }
    }
}
