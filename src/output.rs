//! User-facing formatting of predictions and route listings.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::commands::TrafficReport;
use crate::demand::PredictedDemand;
use crate::routes::NormalizedRoute;

pub const NO_ROUTES_MESSAGE: &str = "No routes found. Please check the locations.";

pub fn demand_line(demand: PredictedDemand) -> String {
    format!("Predicted Commuter Demand: {demand} passengers")
}

/// `Route N: <distance>, Estimated Time: <duration>, Traffic Level: <n>`,
/// numbered from 1.
pub fn route_lines(routes: &[NormalizedRoute]) -> Vec<String> {
    routes
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Route {}: {}, Estimated Time: {}, Traffic Level: {}",
                i + 1,
                r.distance_text,
                r.duration_text,
                r.congestion_estimate
            )
        })
        .collect()
}

pub fn report_lines(report: &TrafficReport) -> Vec<String> {
    match report {
        TrafficReport::Routes(routes) => route_lines(routes),
        TrafficReport::NoRoutes => vec![NO_ROUTES_MESSAGE.to_string()],
    }
}

/// Pretty-printed JSON for any result.
pub fn to_json(value: &impl Serialize) -> Result<String> {
    let json = serde_json::to_string_pretty(value)?;
    debug!(bytes = json.len(), "Rendered JSON output");
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(distance: &str, duration: &str, warnings: u32) -> NormalizedRoute {
        NormalizedRoute {
            distance_text: distance.to_string(),
            duration_text: duration.to_string(),
            congestion_estimate: warnings,
            path: vec![(0.0, 0.0)],
        }
    }

    #[test]
    fn test_route_lines_are_numbered_from_one() {
        let lines = route_lines(&[route("5.2 km", "12 mins", 1), route("6.0 km", "15 mins", 0)]);

        assert_eq!(
            lines,
            vec![
                "Route 1: 5.2 km, Estimated Time: 12 mins, Traffic Level: 1",
                "Route 2: 6.0 km, Estimated Time: 15 mins, Traffic Level: 0",
            ]
        );
    }

    #[test]
    fn test_no_routes_message() {
        assert_eq!(report_lines(&TrafficReport::NoRoutes), vec![NO_ROUTES_MESSAGE]);
    }

    #[test]
    fn test_demand_line() {
        assert_eq!(demand_line(42), "Predicted Commuter Demand: 42 passengers");
    }

    #[test]
    fn test_report_json_is_tagged() {
        let json = to_json(&TrafficReport::Routes(vec![route("1 km", "2 mins", 0)])).unwrap();
        assert!(json.contains("\"routes\""));
        assert!(json.contains("\"distance_text\": \"1 km\""));

        let none = to_json(&TrafficReport::NoRoutes).unwrap();
        assert!(none.contains("no_routes"));
    }
}
