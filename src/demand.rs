//! Commuter demand estimation.
//!
//! A [`DemandRequest`] is turned into a single [`FeatureVector`] row in the
//! column order the trained model expects, and the model's first prediction
//! becomes the [`PredictedDemand`].

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::DemandModel;

/// Weekday names accepted by [`day_code`], indexed by their model code.
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Code passed to the model for a day name outside [`DAY_NAMES`].
pub const UNKNOWN_DAY: i8 = -1;

/// Weather codes: 0 clear, 1 cloudy, 2 rainy.
pub const MAX_WEATHER_CODE: u8 = 2;

/// Predicted passenger count.
pub type PredictedDemand = u32;

/// Maps a weekday name to its model code (Monday = 0 ... Sunday = 6).
///
/// Matching is exact. Any other string yields [`UNKNOWN_DAY`] instead of an
/// error, which is what the trained model has always been fed for
/// unrecognized days.
pub fn day_code(name: &str) -> i8 {
    DAY_NAMES
        .iter()
        .position(|d| *d == name)
        .map_or(UNKNOWN_DAY, |i| i as i8)
}

/// Inputs for one demand prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandRequest {
    pub hour: u8,
    pub day_of_week: String,
    pub weather_code: u8,
    pub travel_time_minutes: f64,
    pub traffic_level: u32,
}

impl DemandRequest {
    pub fn new(
        hour: u8,
        day_of_week: impl Into<String>,
        weather_code: u8,
        travel_time_minutes: f64,
        traffic_level: u32,
    ) -> Self {
        Self {
            hour,
            day_of_week: day_of_week.into(),
            weather_code,
            travel_time_minutes,
            traffic_level,
        }
    }

    /// Checks the numeric ranges. The day name is deliberately not checked.
    pub fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(Error::InvalidInput(format!(
                "hour must be between 0 and 23, got {}",
                self.hour
            )));
        }
        if self.weather_code > MAX_WEATHER_CODE {
            return Err(Error::InvalidInput(format!(
                "weather code must be 0, 1 or 2, got {}",
                self.weather_code
            )));
        }
        if !self.travel_time_minutes.is_finite() || self.travel_time_minutes <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "travel time must be a positive number of minutes, got {}",
                self.travel_time_minutes
            )));
        }
        Ok(())
    }

    /// Builds the model row for this request.
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            hour: self.hour,
            day: day_code(&self.day_of_week),
            traffic_congestion_level: self.traffic_level,
            weather_conditions: self.weather_code,
            travel_time_between_stops: self.travel_time_minutes,
        }
    }
}

/// One model input row.
///
/// The column order in [`FeatureVector::COLUMNS`] is fixed by the trained
/// model; changing it requires retraining.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    #[serde(rename = "Hour")]
    pub hour: u8,
    #[serde(rename = "Day")]
    pub day: i8,
    #[serde(rename = "Traffic_Congestion_Level")]
    pub traffic_congestion_level: u32,
    #[serde(rename = "Weather_Conditions")]
    pub weather_conditions: u8,
    #[serde(rename = "Travel_Time_Between_Stops")]
    pub travel_time_between_stops: f64,
}

impl FeatureVector {
    pub const COLUMNS: [&'static str; 5] = [
        "Hour",
        "Day",
        "Traffic_Congestion_Level",
        "Weather_Conditions",
        "Travel_Time_Between_Stops",
    ];

    /// Values in [`FeatureVector::COLUMNS`] order.
    pub fn values(&self) -> [f64; 5] {
        [
            f64::from(self.hour),
            f64::from(self.day),
            f64::from(self.traffic_congestion_level),
            f64::from(self.weather_conditions),
            self.travel_time_between_stops,
        ]
    }
}

/// Predicts commuter demand with an injected, read-only model.
pub struct DemandEstimator<M> {
    model: M,
}

impl<M: DemandModel> DemandEstimator<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Predicts the passenger count for `request`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] when the request is out of range,
    /// [`Error::PredictionFailed`] when the model errors, returns no values,
    /// or returns a non-finite or out-of-range value.
    pub fn predict(&self, request: &DemandRequest) -> Result<PredictedDemand> {
        request.validate()?;

        let features = request.features();
        if features.day == UNKNOWN_DAY {
            warn!(day = %request.day_of_week, "Unrecognized day name, passing {UNKNOWN_DAY} to the model");
        }
        debug!(?features, "Feature vector assembled");

        let predictions = self
            .model
            .predict(std::slice::from_ref(&features))
            .map_err(|e| Error::PredictionFailed(format!("{e:#}")))?;

        let first = *predictions
            .first()
            .ok_or_else(|| Error::PredictionFailed("model returned no predictions".to_string()))?;

        to_demand(first)
    }
}

/// Truncates a raw model output toward zero; negative outputs become 0 and
/// outputs beyond [`PredictedDemand`] are rejected.
fn to_demand(raw: f64) -> Result<PredictedDemand> {
    if !raw.is_finite() {
        return Err(Error::PredictionFailed(format!(
            "model returned a non-finite value: {raw}"
        )));
    }
    if raw < 0.0 {
        warn!(raw, "Model predicted negative demand, clamping to 0");
        return Ok(0);
    }
    let demand = raw.trunc();
    if demand > f64::from(PredictedDemand::MAX) {
        return Err(Error::PredictionFailed(format!(
            "model returned {raw}, above the largest representable demand"
        )));
    }
    Ok(demand as PredictedDemand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn request(hour: u8, day: &str) -> DemandRequest {
        DemandRequest::new(hour, day, 0, 30.0, 1)
    }

    /// Model stub that remembers the rows it was called with.
    struct Capture {
        rows: Mutex<Vec<FeatureVector>>,
        output: Vec<f64>,
    }

    impl Capture {
        fn returning(output: Vec<f64>) -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                output,
            }
        }
    }

    impl DemandModel for Capture {
        fn predict(&self, rows: &[FeatureVector]) -> anyhow::Result<Vec<f64>> {
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(self.output.clone())
        }
    }

    #[test]
    fn test_day_codes_follow_monday_first_order() {
        for (i, name) in DAY_NAMES.iter().enumerate() {
            assert_eq!(day_code(name), i as i8);
        }
        assert_eq!(day_code("Funday"), UNKNOWN_DAY);
        assert_eq!(day_code("monday"), UNKNOWN_DAY);
    }

    #[test]
    fn test_feature_values_follow_column_order() {
        let features = DemandRequest::new(17, "Friday", 2, 12.5, 3).features();

        assert_eq!(features.values(), [17.0, 4.0, 3.0, 2.0, 12.5]);
    }

    #[test]
    fn test_feature_serialization_uses_model_column_names() {
        let features = request(8, "Monday").features();
        let json = serde_json::to_string(&features).unwrap();

        let mut last = 0;
        for column in FeatureVector::COLUMNS {
            let at = json.find(&format!("\"{column}\"")).unwrap();
            assert!(at >= last, "{column} out of order in {json}");
            last = at;
        }
    }

    #[test]
    fn test_predict_example_monday_morning() {
        let estimator = DemandEstimator::new(Capture::returning(vec![42.0]));

        let demand = estimator.predict(&request(8, "Monday")).unwrap();

        assert_eq!(demand, 42);
        let rows = estimator.model().rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), [8.0, 0.0, 1.0, 0.0, 30.0]);
    }

    #[test]
    fn test_unknown_day_is_passed_through() {
        let estimator = DemandEstimator::new(Capture::returning(vec![7.0]));

        let demand = estimator.predict(&request(9, "Someday")).unwrap();

        assert_eq!(demand, 7);
        assert_eq!(estimator.model().rows.lock().unwrap()[0].day, -1);
    }

    #[test]
    fn test_out_of_range_inputs_are_rejected() {
        let estimator = DemandEstimator::new(Capture::returning(vec![1.0]));

        let bad_hour = estimator.predict(&request(24, "Monday"));
        assert!(matches!(bad_hour, Err(Error::InvalidInput(_))));

        let bad_weather = estimator.predict(&DemandRequest::new(8, "Monday", 3, 30.0, 1));
        assert!(matches!(bad_weather, Err(Error::InvalidInput(_))));

        for travel in [0.0, -5.0, f64::NAN] {
            let bad_travel = estimator.predict(&DemandRequest::new(8, "Monday", 0, travel, 1));
            assert!(matches!(bad_travel, Err(Error::InvalidInput(_))));
        }

        assert!(estimator.model().rows.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fractional_output_is_truncated() {
        let estimator = DemandEstimator::new(Capture::returning(vec![41.9, 100.0]));
        assert_eq!(estimator.predict(&request(8, "Tuesday")).unwrap(), 41);
    }

    #[test]
    fn test_negative_output_is_clamped() {
        let estimator = DemandEstimator::new(Capture::returning(vec![-3.7]));
        assert_eq!(estimator.predict(&request(3, "Sunday")).unwrap(), 0);
    }

    #[test]
    fn test_output_beyond_u32_is_rejected() {
        let huge = DemandEstimator::new(Capture::returning(vec![5e9]));
        assert!(matches!(
            huge.predict(&request(8, "Monday")),
            Err(Error::PredictionFailed(_))
        ));

        let max = DemandEstimator::new(Capture::returning(vec![f64::from(u32::MAX) + 0.5]));
        assert_eq!(max.predict(&request(8, "Monday")).unwrap(), u32::MAX);
    }

    #[test]
    fn test_model_failures_surface_as_prediction_failed() {
        let empty = DemandEstimator::new(Capture::returning(vec![]));
        assert!(matches!(
            empty.predict(&request(8, "Monday")),
            Err(Error::PredictionFailed(_))
        ));

        let nan = DemandEstimator::new(Capture::returning(vec![f64::NAN]));
        assert!(matches!(
            nan.predict(&request(8, "Monday")),
            Err(Error::PredictionFailed(_))
        ));

        let broken = DemandEstimator::new(|_: &[FeatureVector]| -> anyhow::Result<Vec<f64>> {
            anyhow::bail!("bad input shape")
        });
        match broken.predict(&request(8, "Monday")) {
            Err(Error::PredictionFailed(msg)) => assert!(msg.contains("bad input shape")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
