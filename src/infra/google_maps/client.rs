use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::fetch::auth::UrlParam;
use crate::fetch::{BasicClient, HttpClient, get_json};
use crate::services::directions_api::{DirectionsProvider, DirectionsResponse, RawRoute};

/// Google Directions API client.
///
/// Every call is a single request with no retry; the timeout is whatever
/// the wrapped [`HttpClient`] enforces.
pub struct GoogleDirectionsClient<C> {
    base_url: String,
    http: C,
}

impl<C: HttpClient> GoogleDirectionsClient<C> {
    /// `http` must already carry the API key (see [`UrlParam`]).
    pub fn new(base_url: impl Into<String>, http: C) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }
}

impl GoogleDirectionsClient<UrlParam<BasicClient>> {
    /// Builds a keyed client from the application configuration.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let key = config.require_maps_api_key()?.to_string();
        let http = BasicClient::with_timeouts(
            Duration::from_secs(config.http_timeout_secs),
            Duration::from_secs(config.http_connect_timeout_secs),
        )?;

        Ok(Self::new(
            config.directions_base_url.clone(),
            UrlParam::google_maps(http, key),
        ))
    }
}

#[async_trait]
impl<C: HttpClient> DirectionsProvider for GoogleDirectionsClient<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_routes(&self, origin: &str, destination: &str) -> Result<Vec<RawRoute>> {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            return Err(Error::InvalidInput(
                "origin and destination must both be provided".to_string(),
            ));
        }

        let query = [
            ("origin", origin),
            ("destination", destination),
            ("mode", "driving"),
            ("departure_time", "now"),
            ("alternatives", "true"),
        ];

        let body: DirectionsResponse = get_json(&self.http, &self.base_url, &query)
            .await
            .map_err(|e| Error::RouteFetchFailed(format!("{e:#}")))?;

        match body.status.as_str() {
            "OK" => {
                debug!(route_count = body.routes.len(), "Directions received");
                Ok(body.routes)
            }
            "ZERO_RESULTS" => {
                debug!("Provider found no route");
                Ok(Vec::new())
            }
            status => {
                let message = body.error_message.unwrap_or_default();
                warn!(status, message = %message, "Directions request rejected");
                Err(Error::RouteFetchFailed(if message.is_empty() {
                    status.to_string()
                } else {
                    format!("{status}: {message}")
                }))
            }
        }
    }
}
