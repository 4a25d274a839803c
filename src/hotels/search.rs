use reqwest::Url;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::browser::{BrowserLauncher, PageSession};
use crate::hotels::extraction::HotelCardExtractor;
use crate::hotels::{HotelFuture, HotelLookup, HotelQuery, HotelSearchError, HotelSearchOutcome};

const RESULT_ROWS: &str = "10";
/// Page-level readiness marker. Result cards are not required, so an empty
/// results page still reaches extraction and becomes `NoHotelsFound`.
pub const PAGE_READY_SELECTOR: &str = "body";

pub fn search_url(base_url: &str, query: &HotelQuery) -> Result<Url, HotelSearchError> {
    let checkout = query.checkout().ok_or_else(|| {
        HotelSearchError::InvalidQuery(format!("stay of {} nights is out of range", query.nights))
    })?;
    let checkin = query.checkin.format("%Y-%m-%d").to_string();
    let checkout = checkout.format("%Y-%m-%d").to_string();

    Url::parse_with_params(
        base_url,
        [
            ("ss", query.city.as_str()),
            ("checkin", checkin.as_str()),
            ("checkout", checkout.as_str()),
            ("rows", RESULT_ROWS),
        ],
    )
    .map_err(|err| HotelSearchError::InvalidQuery(format!("bad search url '{base_url}': {err}")))
}

/// Runs one hotel search: open a page session, load results, extract, close.
pub struct HotelSearcher<'a> {
    launcher: Box<dyn BrowserLauncher + 'a>,
    extractor: HotelCardExtractor,
    base_url: String,
    wait: Duration,
}

impl<'a> HotelSearcher<'a> {
    pub fn new(
        launcher: Box<dyn BrowserLauncher + 'a>,
        base_url: impl Into<String>,
        wait_secs: u64,
    ) -> Result<Self, HotelSearchError> {
        Ok(Self {
            launcher,
            extractor: HotelCardExtractor::booking()?,
            base_url: base_url.into(),
            wait: Duration::from_secs(wait_secs),
        })
    }

    #[instrument(level = "info", skip(self, query), fields(city = %query.city, nights = query.nights))]
    pub async fn search(
        &self,
        query: &HotelQuery,
    ) -> Result<HotelSearchOutcome, HotelSearchError> {
        let url = search_url(&self.base_url, query)?;
        let mut session = self.launcher.open().await?;

        let outcome = self.drive(session.as_mut(), url.as_str(), query.nights).await;

        // every path out of `drive` comes through here
        if let Err(err) = session.close().await {
            warn!(error = %err, "failed to close page session");
        }

        let outcome = outcome?;
        info!(offers = outcome.offers().len(), "hotel search finished");
        Ok(outcome)
    }

    async fn drive(
        &self,
        session: &mut dyn PageSession,
        url: &str,
        nights: u32,
    ) -> Result<HotelSearchOutcome, HotelSearchError> {
        session.goto(url).await?;
        session.wait_for(PAGE_READY_SELECTOR, self.wait).await?;
        let html = session.page_source().await?;
        Ok(self.extractor.extract_document(&html, nights))
    }
}

impl HotelLookup for HotelSearcher<'_> {
    fn lookup<'a>(&'a self, query: &'a HotelQuery) -> HotelFuture<'a> {
        Box::pin(self.search(query))
    }
}
