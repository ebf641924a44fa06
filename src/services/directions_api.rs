//! Trait and raw response types for a driving-directions provider.
//!
//! The types mirror the Google Directions JSON schema, keeping only the
//! fields route normalization needs.

use serde::Deserialize;

use crate::error::Result;

/// A `{ "text": "5.2 km", "value": 5200 }` pair.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextValue {
    pub text: String,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub start_location: LatLng,
    #[serde(default)]
    pub end_location: Option<LatLng>,
}

/// One origin-to-destination segment of a route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Leg {
    pub distance: TextValue,
    pub duration: TextValue,
    /// Only present for driving requests with a departure time.
    #[serde(default)]
    pub duration_in_traffic: Option<TextValue>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One route alternative as returned by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawRoute {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Top-level Directions API body.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<RawRoute>,
}

/// Abstraction over a live directions service (e.g., Google Maps).
#[async_trait::async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Returns the driving route alternatives from `origin` to `destination`,
    /// departing now, in provider order (recommended first).
    ///
    /// An empty list means no route was found. Upstream failures are
    /// reported as [`Error::RouteFetchFailed`](crate::error::Error::RouteFetchFailed).
    async fn fetch_routes(&self, origin: &str, destination: &str) -> Result<Vec<RawRoute>>;
}
