//! Typed failures surfaced to callers of the estimator and route commands.

/// Errors returned by the demand and route operations.
///
/// An empty route list is not an error; see
/// [`TrafficReport::NoRoutes`](crate::commands::TrafficReport::NoRoutes).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
    #[error("route fetch failed: {0}")]
    RouteFetchFailed(String),
    #[error("failed to load model: {0}")]
    ModelLoad(String),
}

pub type Result<T> = std::result::Result<T, Error>;
