//! Commuter demand prediction and live route analysis.
//!
//! [`demand::DemandEstimator`] scores time/weather/traffic inputs with an
//! injected [`model::DemandModel`]; [`routes::normalize`] reduces a
//! directions provider's alternatives to display-ready routes. The
//! [`commands`] module wires both to the user-facing actions.

pub mod batch;
pub mod commands;
pub mod config;
pub mod demand;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod model;
pub mod output;
pub mod render;
pub mod routes;
pub mod services;
