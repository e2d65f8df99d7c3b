use axum::{extract::State, Json};
use serde::Serialize;

use super::AdminState;
use crate::observability::{EndpointStats, GatewayStats};
use crate::registry::EndpointSnapshot;
use crate::routing::RouteRule;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub strategy: &'static str,
    pub health_monitor_running: bool,
}

#[derive(Serialize)]
pub struct ServiceStatus {
    #[serde(flatten)]
    pub endpoint: EndpointSnapshot,
    pub traffic: Option<EndpointStats>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        strategy: state.gateway.config().strategy.as_str(),
        health_monitor_running: state.gateway.is_running(),
    })
}

pub async fn get_services(State(state): State<AdminState>) -> Json<Vec<ServiceStatus>> {
    let services = state
        .gateway
        .services()
        .into_iter()
        .map(|endpoint| {
            let traffic = state.gateway.endpoint_stats(&endpoint.id);
            ServiceStatus { endpoint, traffic }
        })
        .collect();

    Json(services)
}

pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteRule>> {
    Json(state.gateway.routes().iter().map(|r| r.as_ref().clone()).collect())
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<GatewayStats> {
    Json(state.gateway.get_stats())
}
