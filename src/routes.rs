//! Turns raw directions alternatives into display-ready routes.

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::services::directions_api::RawRoute;

/// A route reduced to what the listing and the map need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRoute {
    pub distance_text: String,
    pub duration_text: String,
    /// Number of provider warnings on the route. A coarse proxy, not a
    /// calibrated congestion measure.
    pub congestion_estimate: u32,
    /// `(latitude, longitude)` of each step start, in travel order. Never
    /// empty when produced by [`normalize`].
    pub path: Vec<(f64, f64)>,
}

impl NormalizedRoute {
    pub fn start(&self) -> Option<(f64, f64)> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<(f64, f64)> {
        self.path.last().copied()
    }
}

/// Normalizes every alternative, preserving provider order.
///
/// Only the first leg of each route is read. Its traffic-aware duration is
/// used when present, the plain duration otherwise.
///
/// # Errors
///
/// [`Error::RouteFetchFailed`] when a route has no legs or no steps, since
/// such a route cannot be drawn.
pub fn normalize(routes: &[RawRoute]) -> Result<Vec<NormalizedRoute>> {
    routes
        .iter()
        .enumerate()
        .map(|(i, route)| normalize_route(i + 1, route))
        .collect()
}

fn normalize_route(number: usize, route: &RawRoute) -> Result<NormalizedRoute> {
    let leg = route
        .legs
        .first()
        .ok_or_else(|| Error::RouteFetchFailed(format!("route {number} has no legs")))?;

    if leg.steps.is_empty() {
        return Err(Error::RouteFetchFailed(format!("route {number} has no steps")));
    }

    let duration = match &leg.duration_in_traffic {
        Some(in_traffic) => &in_traffic.text,
        None => {
            debug!(route = number, "No traffic-aware duration, using plain duration");
            &leg.duration.text
        }
    };

    Ok(NormalizedRoute {
        distance_text: leg.distance.text.clone(),
        duration_text: duration.clone(),
        congestion_estimate: route.warnings.len() as u32,
        path: leg
            .steps
            .iter()
            .map(|s| (s.start_location.lat, s.start_location.lng))
            .collect(),
    })
}
