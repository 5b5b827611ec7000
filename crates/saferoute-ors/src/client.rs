//! OpenRouteService HTTP client.

use crate::wire::{classify_failure, parse_directions, DirectionsBody};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use saferoute_core::{Error, RawRoute, RouteClient, RouteRequest};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// HTTP client for the ORS directions API.
pub struct OrsClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl OrsClient {
    /// Create a new ORS client.
    /// An empty key sends no `Authorization` header (self-hosted ORS needs none).
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key.trim().to_string())
        };
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn directions_url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/v2/directions/{}/geojson",
            self.base_url,
            request.profile.as_str()
        )
    }

    /// Request a route; one HTTP round trip, no retries.
    pub async fn fetch_directions(&self, request: &RouteRequest) -> Result<RawRoute, Error> {
        let url = self.directions_url(request);
        let body = DirectionsBody::from_request(request);

        let mut builder = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json, application/geo+json")
            .json(&body);
        if let Some(key) = self.api_key.as_deref() {
            builder = builder.header(AUTHORIZATION, key);
        }

        tracing::debug!(
            url = %url,
            avoid = request.avoid.len(),
            "requesting directions"
        );
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = classify_failure(status.as_u16(), &text);
            tracing::debug!(status = status.as_u16(), error = %err, "directions request rejected");
            return Err(err);
        }

        parse_directions(&text)
    }
}

impl RouteClient for OrsClient {
    fn directions<'a>(&'a self, request: &'a RouteRequest) -> BoxFuture<'a, Result<RawRoute, Error>> {
        Box::pin(self.fetch_directions(request))
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::ServiceUnavailable(format!("directions request timed out: {err}"))
    } else if err.is_builder() {
        Error::InvalidRequest(format!("could not build directions request: {err}"))
    } else {
        Error::ServiceUnavailable(format!("directions request failed: {err}"))
    }
}
