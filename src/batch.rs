//! Tabular batch prediction over CSV files.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::demand::{DemandEstimator, DemandRequest, PredictedDemand};
use crate::model::DemandModel;

/// One input row: `hour,day,weather,travel_time,traffic_level`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    pub hour: u8,
    pub day: String,
    pub weather: u8,
    pub travel_time: f64,
    pub traffic_level: u32,
}

impl From<&BatchRow> for DemandRequest {
    fn from(row: &BatchRow) -> Self {
        DemandRequest::new(
            row.hour,
            row.day.clone(),
            row.weather,
            row.travel_time,
            row.traffic_level,
        )
    }
}

/// One output row: the inputs plus either a prediction or an error.
#[derive(Debug, Serialize)]
pub struct PredictionRecord {
    pub predicted_at: DateTime<Utc>,
    pub hour: Option<u8>,
    pub day: Option<String>,
    pub weather: Option<u8>,
    pub travel_time: Option<f64>,
    pub traffic_level: Option<u32>,
    pub predicted_demand: Option<PredictedDemand>,
    pub error: Option<String>,
}

impl PredictionRecord {
    fn from_row(row: &BatchRow, outcome: crate::error::Result<PredictedDemand>) -> Self {
        let (predicted_demand, error) = match outcome {
            Ok(demand) => (Some(demand), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            predicted_at: Utc::now(),
            hour: Some(row.hour),
            day: Some(row.day.clone()),
            weather: Some(row.weather),
            travel_time: Some(row.travel_time),
            traffic_level: Some(row.traffic_level),
            predicted_demand,
            error,
        }
    }

    /// Record for a line that could not be parsed.
    fn from_error(message: String) -> Self {
        Self {
            predicted_at: Utc::now(),
            hour: None,
            day: None,
            weather: None,
            travel_time: None,
            traffic_level: None,
            predicted_demand: None,
            error: Some(message),
        }
    }
}

/// Summary of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub predicted: usize,
    pub failed: usize,
}

/// Predicts every row of `input` and writes the results to `output`.
///
/// A row that fails to parse or predict is written as an error record and
/// the batch continues.
pub fn predict_csv<M: DemandModel>(
    estimator: &DemandEstimator<M>,
    input: &Path,
    output: &Path,
) -> Result<BatchSummary> {
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(input)
        .with_context(|| format!("opening {}", input.display()))?;
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(output)
        .with_context(|| format!("creating {}", output.display()))?;

    let mut summary = BatchSummary::default();

    for (line, row) in reader.deserialize::<BatchRow>().enumerate() {
        let record = match row {
            Ok(row) => {
                let outcome = estimator.predict(&DemandRequest::from(&row));
                if let Err(e) = &outcome {
                    warn!(line = line + 2, error = %e, "Row prediction failed");
                }
                PredictionRecord::from_row(&row, outcome)
            }
            Err(e) => {
                warn!(line = line + 2, error = %e, "Row could not be parsed");
                PredictionRecord::from_error(e.to_string())
            }
        };

        if record.error.is_some() {
            summary.failed += 1;
        } else {
            summary.predicted += 1;
        }
        debug!(?record, "Batch record");
        writer.serialize(&record)?;
    }

    writer.flush()?;
    info!(
        predicted = summary.predicted,
        failed = summary.failed,
        output = %output.display(),
        "Batch prediction complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::FeatureVector;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    /// Predicts `hour * 10` so outputs are easy to check.
    fn estimator() -> DemandEstimator<impl DemandModel> {
        DemandEstimator::new(|rows: &[FeatureVector]| -> anyhow::Result<Vec<f64>> {
            Ok(rows.iter().map(|r| f64::from(r.hour) * 10.0).collect())
        })
    }

    #[test]
    fn test_predicts_each_row() {
        let input = temp_path("commuter_demand_batch_ok.csv");
        let output = temp_path("commuter_demand_batch_ok_out.csv");
        fs::write(
            &input,
            "hour,day,weather,travel_time,traffic_level\n8,Monday,0,30,1\n17, Friday ,2,45.5,3\n",
        )
        .unwrap();

        let summary = predict_csv(&estimator(), &input, &output).unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                predicted: 2,
                failed: 0
            }
        );
        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("predicted_demand"));
        assert!(lines[1].contains(",80,"));
        assert!(lines[2].contains("Friday") && lines[2].contains(",170,"));

        fs::remove_file(&input).unwrap();
        fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_bad_rows_become_error_records() {
        let input = temp_path("commuter_demand_batch_bad.csv");
        let output = temp_path("commuter_demand_batch_bad_out.csv");
        fs::write(
            &input,
            "hour,day,weather,travel_time,traffic_level\n30,Monday,0,30,1\nlate,Monday,0,30,1\n9,Tuesday,1,20,0\n",
        )
        .unwrap();

        let summary = predict_csv(&estimator(), &input, &output).unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                predicted: 1,
                failed: 2
            }
        );
        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("invalid input: hour must be between 0 and 23"));
        assert!(content.contains(",90,"));

        fs::remove_file(&input).unwrap();
        fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_missing_input_file_fails() {
        let err = predict_csv(
            &estimator(),
            &temp_path("commuter_demand_batch_missing.csv"),
            &temp_path("commuter_demand_batch_missing_out.csv"),
        )
        .unwrap_err();

        assert!(err.to_string().contains("opening"));
    }
}
