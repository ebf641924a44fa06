mod client;

pub use client::GoogleDirectionsClient;
