//! Flight offers from the Amadeus self-service API.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, RetryPolicy};
use crate::providers::http_errors::{TRAVEL_API, request_error};
use crate::retry::send_with_retry;

const MAX_OFFERS: usize = 5;

#[derive(Debug, Error)]
pub enum FlightError {
    #[error("AMADEUS_ACCESS_TOKEN is not set; flight lookups need a travel API token")]
    MissingToken,

    #[error("no airport or city matches '{0}'")]
    LocationNotFound(String),

    #[error("travel API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("unexpected travel API response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlightOffer {
    pub carrier: String,
    pub total_price: f64,
    pub currency: String,
    pub stops: usize,
    pub departure: String,
    pub arrival: String,
}

impl FlightOffer {
    pub fn summary(&self) -> String {
        let stops = match self.stops {
            0 => "nonstop".to_string(),
            1 => "1 stop".to_string(),
            n => format!("{n} stops"),
        };
        format!(
            "{:<3} {} -> {}  {}  {} {:.2}",
            self.carrier, self.departure, self.arrival, stops, self.currency, self.total_price
        )
    }
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(rename = "iataCode")]
    iata_code: String,
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<RawOffer>,
}

#[derive(Debug, Deserialize)]
struct RawOffer {
    price: RawPrice,
    #[serde(default)]
    itineraries: Vec<Itinerary>,
    #[serde(default, rename = "validatingAirlineCodes")]
    validating_airline_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    currency: String,
    total: String,
}

#[derive(Debug, Deserialize)]
struct Itinerary {
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
struct Segment {
    departure: Endpoint,
    arrival: Endpoint,
    #[serde(rename = "carrierCode")]
    carrier_code: String,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    #[serde(rename = "iataCode")]
    iata_code: String,
    at: String,
}

fn is_iata_code(text: &str) -> bool {
    text.len() == 3 && text.chars().all(|c| c.is_ascii_alphabetic())
}

fn short_time(at: &str) -> String {
    // "2026-11-15T10:05:00" -> "2026-11-15 10:05"
    match at.split_once('T') {
        Some((date, time)) => format!("{date} {}", time.get(..5).unwrap_or(time)),
        None => at.to_string(),
    }
}

fn to_offer(raw: RawOffer) -> Option<FlightOffer> {
    let segments = &raw.itineraries.first()?.segments;
    let first = segments.first()?;
    let last = segments.last()?;
    let carrier = raw
        .validating_airline_codes
        .first()
        .cloned()
        .unwrap_or_else(|| first.carrier_code.clone());

    Some(FlightOffer {
        carrier,
        total_price: raw.price.total.parse().ok()?,
        currency: raw.price.currency,
        stops: segments.len().saturating_sub(1),
        departure: format!(
            "{} {}",
            first.departure.iata_code,
            short_time(&first.departure.at)
        ),
        arrival: format!("{} {}", last.arrival.iata_code, short_time(&last.arrival.at)),
    })
}

fn offers_from(response: OffersResponse) -> Vec<FlightOffer> {
    let mut offers: Vec<FlightOffer> = response.data.into_iter().filter_map(to_offer).collect();
    offers.sort_by(|a, b| a.total_price.total_cmp(&b.total_price));
    offers.truncate(MAX_OFFERS);
    offers
}

pub struct FlightClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl FlightClient {
    pub fn from_config(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            base_url: cfg.amadeus_base_url.trim_end_matches('/').to_string(),
            token: cfg.amadeus_access_token.clone(),
            retry: cfg.retry_policy.clone(),
            timeout: Duration::from_secs(cfg.http_timeout_secs),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, FlightError> {
        let token = self.token.as_deref().ok_or(FlightError::MissingToken)?;
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "calling travel API");

        let response = send_with_retry(&self.retry, &url, || {
            self.client
                .get(&url)
                .query(params)
                .bearer_auth(token)
                .timeout(self.timeout)
        })
        .await
        .map_err(|err| {
            FlightError::Transport(format!(
                "{:#}",
                request_error(TRAVEL_API, err, &url, self.timeout.as_secs())
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "travel API returned non-success status");
            return Err(FlightError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| FlightError::Decode(err.to_string()))
    }

    /// Returns `place` unchanged when it already looks like an IATA code.
    pub async fn resolve_location(&self, place: &str) -> Result<String, FlightError> {
        let trimmed = place.trim();
        if is_iata_code(trimmed) {
            return Ok(trimmed.to_ascii_uppercase());
        }

        let found: LocationsResponse = self
            .get(
                "/v1/reference-data/locations",
                &[
                    ("subType", "CITY,AIRPORT".to_string()),
                    ("keyword", trimmed.to_ascii_uppercase()),
                ],
            )
            .await?;
        found
            .data
            .into_iter()
            .next()
            .map(|location| location.iata_code)
            .ok_or_else(|| FlightError::LocationNotFound(trimmed.to_string()))
    }

    #[instrument(level = "info", skip(self), fields(origin = %query.origin, destination = %query.destination))]
    pub async fn search(&self, query: &FlightQuery) -> Result<Vec<FlightOffer>, FlightError> {
        let origin = self.resolve_location(&query.origin).await?;
        let destination = self.resolve_location(&query.destination).await?;

        let response: OffersResponse = self
            .get(
                "/v2/shopping/flight-offers",
                &[
                    ("originLocationCode", origin),
                    ("destinationLocationCode", destination),
                    ("departureDate", query.date.format("%Y-%m-%d").to_string()),
                    ("adults", "1".to_string()),
                    ("max", MAX_OFFERS.to_string()),
                ],
            )
            .await?;
        let offers = offers_from(response);
        info!(offers = offers.len(), "flight search finished");
        Ok(offers)
    }
}
