use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_GEOCODING_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Geocoding service returned {status} for address '{address}'")]
    Status {
        status: reqwest::StatusCode,
        address: String,
    },

    #[error("Failed to parse geocoding response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single entry of `address_components` in a geocoding result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geometry {
    pub location: Location,
}

/// Best-match result returned by the geocoding service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    pub geometry: Geometry,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Raw response envelope. `status` is informational only; an empty
/// `results` list means no match regardless of what it says. Results stay
/// as raw JSON so only the first one has to be well formed.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl GeocodeResponse {
    /// Consume the envelope and decode only the first result
    pub fn into_first_result(self) -> Result<Option<GeocodeResult>, serde_json::Error> {
        self.results
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
    }
}

/// Something that resolves a free-text address to at most one result
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, GeocodeError>;
}

/// Client for the Google Geocoding API
#[derive(Clone)]
pub struct GeocodingClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeocodingClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GEOCODING_URL, api_key)
    }

    /// Point the client at a different endpoint (used by tests)
    pub fn with_base_url(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse_body(&self, address: &str, body: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        let response: GeocodeResponse = serde_json::from_str(body)?;

        match response.status.as_deref() {
            Some("OK") | Some("ZERO_RESULTS") | None => {}
            Some(status) => warn!(
                "Geocoding status {} for '{}': {}",
                status,
                address,
                response.error_message.as_deref().unwrap_or("no message")
            ),
        }

        let result = response.into_first_result()?;
        if result.is_none() {
            debug!("No geocoding result for '{}'", address);
        }
        Ok(result)
    }
}

impl Geocoder for GeocodingClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        debug!("Sending geocoding request");
        let response = self
            .client
            .get(&self.url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        debug!("Received HTTP response with status: {}", status);
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status,
                address: address.to_string(),
            });
        }

        let body = response.text().await?;
        self.parse_body(address, &body)
    }
}
