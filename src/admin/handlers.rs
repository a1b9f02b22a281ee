use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::http::server::AppState;
use crate::load_balancer::host::Host;
use crate::load_balancer::{Selector, Strategy};

#[derive(Debug, Serialize)]
pub struct HostView {
    pub service: String,
    pub address: String,
    pub port: u16,
}

impl From<&Host> for HostView {
    fn from(host: &Host) -> Self {
        Self {
            service: host.service_name().to_string(),
            address: host.address().to_string(),
            port: host.port(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceView {
    pub name: String,
    pub hosts: Vec<HostView>,
}

#[derive(Debug, Serialize)]
pub struct HostLoad {
    #[serde(flatten)]
    pub host: HostView,
    pub calls: u64,
    pub busy: bool,
}

#[derive(Debug, Serialize)]
pub struct StrategyLoad {
    pub threshold: u64,
    pub window_secs: Option<u64>,
    pub hosts: Vec<HostLoad>,
}

impl From<&Selector> for StrategyLoad {
    fn from(selector: &Selector) -> Self {
        let threshold = selector.threshold();
        let counter = selector.counter();
        Self {
            threshold,
            window_secs: counter.window().map(|w| w.as_secs()),
            hosts: counter
                .snapshot()
                .into_iter()
                .map(|(host, calls)| HostLoad {
                    host: HostView::from(&host),
                    calls,
                    busy: calls > threshold,
                })
                .collect(),
        }
    }
}

pub async fn get_hosts(State(state): State<AppState>) -> Json<Vec<ServiceView>> {
    let registry = state.proxy.registry();
    let services = registry
        .services()
        .iter()
        .map(|name| ServiceView {
            name: name.clone(),
            hosts: registry
                .hosts_for(name)
                .map(|hosts| hosts.iter().map(HostView::from).collect())
                .unwrap_or_default(),
        })
        .collect();
    Json(services)
}

/// Per-strategy tallies keyed by strategy token.
pub async fn get_load(State(state): State<AppState>) -> Json<BTreeMap<&'static str, StrategyLoad>> {
    let load = Strategy::ALL
        .iter()
        .map(|&strategy| (strategy.as_str(), StrategyLoad::from(state.proxy.selector(strategy))))
        .collect();
    Json(load)
}
