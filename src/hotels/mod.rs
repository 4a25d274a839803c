pub mod extraction;
pub mod offer;
pub mod ranking;
pub mod render;
pub mod search;
pub mod travel_advisor;

use chrono::{Days, NaiveDate};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

use crate::browser::BrowserError;

pub use offer::HotelOffer;
pub use ranking::SortOrder;

#[derive(Debug, Error)]
pub enum HotelSearchError {
    #[error("invalid hotel search: {0}")]
    InvalidQuery(String),

    #[error("hotel page extractor misconfigured: {0}")]
    Extractor(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("RAPIDAPI_KEY is not set; HOTEL_SOURCE=travel_advisor needs a RapidAPI key")]
    MissingApiKey,

    #[error("hotel API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("unexpected hotel API response: {0}")]
    Decode(String),
}

pub type HotelFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HotelSearchOutcome, HotelSearchError>> + 'a>>;

/// A place hotel offers can be looked up: the scraped listings page or a
/// hotel API.
pub trait HotelLookup {
    fn lookup<'a>(&'a self, query: &'a HotelQuery) -> HotelFuture<'a>;
}

/// Result of one search. An empty page is its own variant so it can't be
/// confused with "not searched yet".
#[derive(Debug, Clone, PartialEq)]
pub enum HotelSearchOutcome {
    /// At least one offer, in page order until re-sorted.
    Found(Vec<HotelOffer>),
    NoHotelsFound,
}

impl HotelSearchOutcome {
    pub fn from_offers(offers: Vec<HotelOffer>) -> Self {
        if offers.is_empty() {
            Self::NoHotelsFound
        } else {
            Self::Found(offers)
        }
    }

    pub fn offers(&self) -> &[HotelOffer] {
        match self {
            Self::Found(offers) => offers,
            Self::NoHotelsFound => &[],
        }
    }

    pub fn sort(&mut self, order: SortOrder) {
        if let Self::Found(offers) = self {
            ranking::sort_offers(offers, order);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelQuery {
    pub city: String,
    pub checkin: NaiveDate,
    pub nights: u32,
}

impl HotelQuery {
    pub fn new(
        city: impl Into<String>,
        checkin: NaiveDate,
        nights: u32,
    ) -> Result<Self, HotelSearchError> {
        let city = city.into().trim().to_string();
        if city.is_empty() {
            return Err(HotelSearchError::InvalidQuery(
                "city must not be empty".to_string(),
            ));
        }
        Ok(Self {
            city,
            checkin,
            nights,
        })
    }

    pub fn checkout(&self) -> Option<NaiveDate> {
        self.checkin.checked_add_days(Days::new(u64::from(self.nights)))
    }
}

/// The held result set of the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct HotelSearch {
    pub query: HotelQuery,
    pub outcome: HotelSearchOutcome,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{HotelOffer, HotelQuery, HotelSearchOutcome, SortOrder};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn empty_offer_list_becomes_no_hotels_found() {
        assert_eq!(
            HotelSearchOutcome::from_offers(Vec::new()),
            HotelSearchOutcome::NoHotelsFound
        );
        assert!(HotelSearchOutcome::NoHotelsFound.offers().is_empty());
    }

    #[test]
    fn sort_reorders_found_offers_in_place() {
        let mut outcome = HotelSearchOutcome::from_offers(vec![
            HotelOffer::new("b", None, Some(200.0), 1),
            HotelOffer::new("a", None, Some(100.0), 1),
        ]);
        outcome.sort(SortOrder::PriceAscending);
        assert_eq!(outcome.offers()[0].name, "a");

        let mut empty = HotelSearchOutcome::NoHotelsFound;
        empty.sort(SortOrder::RatingDescending);
        assert_eq!(empty, HotelSearchOutcome::NoHotelsFound);
    }

    #[test]
    fn query_trims_city_and_computes_checkout() {
        let query = HotelQuery::new("  Lisbon ", date(2026, 12, 30), 3).expect("valid query");
        assert_eq!(query.city, "Lisbon");
        assert_eq!(query.checkout(), Some(date(2027, 1, 2)));
    }

    #[test]
    fn query_rejects_blank_city() {
        assert!(HotelQuery::new("   ", date(2026, 1, 1), 2).is_err());
    }
}
