use async_trait::async_trait;
use commuter_demand::commands::{TrafficReport, predict_demand, route_map, traffic_report};
use commuter_demand::demand::{DemandEstimator, DemandRequest};
use commuter_demand::error::Result;
use commuter_demand::model::GradientBoostedModel;
use commuter_demand::services::directions_api::{
    DirectionsProvider, DirectionsResponse, RawRoute,
};

/// Serves the recorded Directions response from the fixtures.
struct Recorded;

#[async_trait]
impl DirectionsProvider for Recorded {
    async fn fetch_routes(&self, _origin: &str, _destination: &str) -> Result<Vec<RawRoute>> {
        let body: DirectionsResponse =
            serde_json::from_str(include_str!("fixtures/directions_two_routes.json"))
                .expect("fixture should parse");
        Ok(body.routes)
    }
}

fn estimator() -> DemandEstimator<GradientBoostedModel> {
    let model = GradientBoostedModel::from_json(include_str!("fixtures/demand_model.json"))
        .expect("Failed to load model fixture");
    DemandEstimator::new(model)
}

#[test]
fn test_model_fixture_predictions() {
    let estimator = estimator();

    let cases = [
        (8, "Monday", 38),
        (6, "Saturday", 29),
        (14, "Sunday", 19),
        // Unknown day code -1 falls on the weekday branch.
        (8, "Funday", 38),
    ];
    for (hour, day, expected) in cases {
        let request = DemandRequest::new(hour, day, 0, 30.0, 1);
        assert_eq!(
            predict_demand(&estimator, &request).unwrap(),
            expected,
            "hour {hour}, {day}"
        );
    }
}

#[tokio::test]
async fn test_traffic_report_from_recorded_response() {
    let report = traffic_report(&Recorded, "Union Station", "City Hall")
        .await
        .unwrap();

    let TrafficReport::Routes(routes) = report else {
        panic!("expected routes");
    };
    assert_eq!(routes.len(), 2);

    assert_eq!(routes[0].distance_text, "5.2 km");
    assert_eq!(routes[0].duration_text, "12 mins");
    assert_eq!(routes[0].congestion_estimate, 1);
    assert_eq!(routes[0].path.len(), 4);
    assert_eq!(routes[0].start(), Some((40.75, -73.99)));

    assert_eq!(routes[1].distance_text, "6.0 km");
    assert_eq!(routes[1].duration_text, "15 mins");
    assert_eq!(routes[1].congestion_estimate, 0);
    assert_eq!(routes[1].path.len(), 3);
}

#[tokio::test]
async fn test_route_map_from_recorded_response() {
    let map = route_map(&Recorded, "Union Station", "City Hall")
        .await
        .unwrap()
        .expect("two routes should produce a map");

    // Origin, destination, two route lines.
    assert_eq!(map.features.len(), 4);
    let destination = map.features[1].geometry.as_ref().unwrap();
    assert_eq!(destination.value, geojson::Value::Point(vec![-74.0, 40.72]));
}
