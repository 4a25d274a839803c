//! Hotel listings from the Travel Advisor API on RapidAPI.
//!
//! A lookup is two calls: `locations/search` turns the city into a
//! `location_id`, then `hotels/list` returns the hotels for that location.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, RetryPolicy};
use crate::hotels::offer::parse_price;
use crate::hotels::{
    HotelFuture, HotelLookup, HotelOffer, HotelQuery, HotelSearchError, HotelSearchOutcome,
};
use crate::providers::http_errors::{HOTEL_API, request_error};
use crate::retry::send_with_retry;

const RAPIDAPI_HOST: &str = "travel-advisor.p.rapidapi.com";
const LIST_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<LocationHit>,
}

#[derive(Debug, Deserialize)]
struct LocationHit {
    result_object: Option<ResultObject>,
}

#[derive(Debug, Deserialize)]
struct ResultObject {
    location_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct HotelsResponse {
    #[serde(default)]
    data: Vec<ListedHotel>,
}

/// Ad slots in the list carry no name and are skipped.
#[derive(Debug, Deserialize)]
struct ListedHotel {
    name: Option<String>,
    rating: Option<Value>,
    price: Option<String>,
}

/// The API sends ids and ratings as strings or numbers depending on the entry.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn first_location_id(response: LocationsResponse) -> Option<String> {
    response
        .data
        .into_iter()
        .filter_map(|hit| hit.result_object)
        .filter_map(|object| object.location_id)
        .find_map(|id| text_of(&id))
}

fn offers_from(response: HotelsResponse, nights: u32) -> Vec<HotelOffer> {
    response
        .data
        .into_iter()
        .filter_map(|hotel| {
            let name = hotel.name.filter(|name| !name.trim().is_empty())?;
            let rating = hotel.rating.as_ref().and_then(text_of);
            let price = hotel.price.as_deref().and_then(parse_price);
            Some(HotelOffer::new(name.trim(), rating, price, nights))
        })
        .collect()
}

pub struct TravelAdvisorClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl TravelAdvisorClient {
    pub fn from_config(client: Client, cfg: &Config) -> Self {
        Self {
            client,
            base_url: cfg.travel_advisor_url.trim_end_matches('/').to_string(),
            api_key: cfg.rapidapi_key.clone(),
            retry: cfg.retry_policy.clone(),
            timeout: Duration::from_secs(cfg.http_timeout_secs),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, HotelSearchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(HotelSearchError::MissingApiKey)?;
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "calling hotel API");

        let response = send_with_retry(&self.retry, &url, || {
            self.client
                .get(&url)
                .query(params)
                .header("X-RapidAPI-Key", key)
                .header("X-RapidAPI-Host", RAPIDAPI_HOST)
                .timeout(self.timeout)
        })
        .await
        .map_err(|err| {
            HotelSearchError::Transport(format!(
                "{:#}",
                request_error(HOTEL_API, err, &url, self.timeout.as_secs())
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "hotel API returned non-success status");
            return Err(HotelSearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| HotelSearchError::Decode(err.to_string()))
    }

    async fn location_id(&self, city: &str) -> Result<Option<String>, HotelSearchError> {
        let found: LocationsResponse = self
            .get(
                "/locations/search",
                &[
                    ("query", city.to_string()),
                    ("limit", "1".to_string()),
                    ("offset", "0".to_string()),
                    ("units", "km".to_string()),
                    ("currency", "USD".to_string()),
                    ("sort", "relevance".to_string()),
                    ("lang", "en_US".to_string()),
                ],
            )
            .await?;
        Ok(first_location_id(found))
    }

    #[instrument(level = "info", skip(self, query), fields(city = %query.city, nights = query.nights))]
    pub async fn search(
        &self,
        query: &HotelQuery,
    ) -> Result<HotelSearchOutcome, HotelSearchError> {
        let Some(location_id) = self.location_id(&query.city).await? else {
            info!("hotel API knows no location for this city");
            return Ok(HotelSearchOutcome::NoHotelsFound);
        };

        let listed: HotelsResponse = self
            .get(
                "/hotels/list",
                &[
                    ("location_id", location_id),
                    ("checkin", query.checkin.format("%Y-%m-%d").to_string()),
                    ("adults", "1".to_string()),
                    ("rooms", "1".to_string()),
                    ("nights", query.nights.to_string()),
                    ("currency", "USD".to_string()),
                    ("order", "asc".to_string()),
                    ("limit", LIST_LIMIT.to_string()),
                    ("lang", "en_US".to_string()),
                ],
            )
            .await?;
        let offers = offers_from(listed, query.nights);
        info!(offers = offers.len(), "hotel API search finished");
        Ok(HotelSearchOutcome::from_offers(offers))
    }
}

impl HotelLookup for TravelAdvisorClient {
    fn lookup<'a>(&'a self, query: &'a HotelQuery) -> HotelFuture<'a> {
        Box::pin(self.search(query))
    }
}
