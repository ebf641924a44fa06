//! Command handlers, one per user action.
//!
//! Each handler is a plain request/response function over injected
//! dependencies, so the CLI (or any other front end) only parses input and
//! prints results.

use geojson::FeatureCollection;
use serde::Serialize;
use tracing::{info, warn};

use crate::demand::{DemandEstimator, DemandRequest, PredictedDemand};
use crate::error::Result;
use crate::model::DemandModel;
use crate::render;
use crate::routes::{NormalizedRoute, normalize};
use crate::services::directions_api::DirectionsProvider;

/// Outcome of a live route lookup. Finding no route is a normal outcome,
/// not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "routes", rename_all = "snake_case")]
pub enum TrafficReport {
    Routes(Vec<NormalizedRoute>),
    NoRoutes,
}

impl TrafficReport {
    pub fn routes(&self) -> &[NormalizedRoute] {
        match self {
            TrafficReport::Routes(routes) => routes,
            TrafficReport::NoRoutes => &[],
        }
    }
}

#[tracing::instrument(skip(estimator), fields(hour = request.hour, day = %request.day_of_week))]
pub fn predict_demand<M: DemandModel>(
    estimator: &DemandEstimator<M>,
    request: &DemandRequest,
) -> Result<PredictedDemand> {
    let demand = estimator.predict(request)?;
    info!(demand, "Demand predicted");
    Ok(demand)
}

/// Fetches and normalizes the live route alternatives.
#[tracing::instrument(skip(provider))]
pub async fn traffic_report<P: DirectionsProvider + ?Sized>(
    provider: &P,
    origin: &str,
    destination: &str,
) -> Result<TrafficReport> {
    let raw = provider.fetch_routes(origin, destination).await?;
    let routes = normalize(&raw)?;

    info!(route_count = routes.len(), "Traffic report ready");
    if routes.is_empty() {
        Ok(TrafficReport::NoRoutes)
    } else {
        Ok(TrafficReport::Routes(routes))
    }
}

/// Fetches the live routes and builds their map, `None` when no route exists.
#[tracing::instrument(skip(provider))]
pub async fn route_map<P: DirectionsProvider + ?Sized>(
    provider: &P,
    origin: &str,
    destination: &str,
) -> Result<Option<FeatureCollection>> {
    let report = traffic_report(provider, origin, destination).await?;
    Ok(render::route_map(report.routes()))
}

/// Congestion estimate of the recommended (first) live route, if any.
///
/// Used to replace a fixed traffic level with a live one before predicting.
#[tracing::instrument(skip(provider))]
pub async fn live_traffic_level<P: DirectionsProvider + ?Sized>(
    provider: &P,
    origin: &str,
    destination: &str,
) -> Result<Option<u32>> {
    let report = traffic_report(provider, origin, destination).await?;
    let level = report.routes().first().map(|r| r.congestion_estimate);
    if level.is_none() {
        warn!("No live route to derive a traffic level from");
    }
    Ok(level)
}
