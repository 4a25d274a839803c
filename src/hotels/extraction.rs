//! Turns a rendered hotel listings page into [`HotelOffer`] records.
//!
//! Each field of a result card is read by a [`FieldExtractor`]. A missing or
//! blank field falls back locally and never affects the other fields of the
//! same card.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::hotels::offer::{HotelOffer, UNNAMED_HOTEL, parse_price};
use crate::hotels::{HotelSearchError, HotelSearchOutcome};

pub const CARD_SELECTOR: &str = r#"div[data-testid="property-card"]"#;
const NAME_SELECTOR: &str = r#"div[data-testid="title"]"#;
const RATING_SELECTOR: &str = r#"div[data-testid="review-score"] > div:nth-child(1)"#;
const PRICE_SELECTORS: [&str; 3] = [
    r#"span[data-testid="price-and-discounted-price"]"#,
    r#"div[data-testid="price-and-discounted-price"]"#,
    r#"span[class*="fcab3ed991"]"#,
];

/// Reads one text field out of a result card.
pub trait FieldExtractor {
    fn extract(&self, card: ElementRef<'_>) -> Option<String>;
}

/// Text of the first element matching a CSS selector inside the card.
pub struct CssText {
    selector: Selector,
}

impl CssText {
    pub fn parse(css: &str) -> Result<Self, HotelSearchError> {
        let selector = Selector::parse(css).map_err(|err| {
            HotelSearchError::Extractor(format!("invalid selector '{css}': {err}"))
        })?;
        Ok(Self { selector })
    }
}

impl FieldExtractor for CssText {
    fn extract(&self, card: ElementRef<'_>) -> Option<String> {
        card.select(&self.selector)
            .next()
            .map(|el| normalize_text(el.text()))
            .filter(|text| !text.is_empty())
    }
}

/// Tries each strategy in order; the first one that yields text wins.
pub struct FirstOf {
    strategies: Vec<Box<dyn FieldExtractor>>,
}

impl FirstOf {
    pub fn new(strategies: Vec<Box<dyn FieldExtractor>>) -> Self {
        Self { strategies }
    }
}

impl FieldExtractor for FirstOf {
    fn extract(&self, card: ElementRef<'_>) -> Option<String> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.extract(card))
    }
}

fn normalize_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct HotelCardExtractor {
    card: Selector,
    name: Box<dyn FieldExtractor>,
    rating: Box<dyn FieldExtractor>,
    price: Box<dyn FieldExtractor>,
}

impl HotelCardExtractor {
    /// Extractor for booking.com search results markup.
    pub fn booking() -> Result<Self, HotelSearchError> {
        let card = Selector::parse(CARD_SELECTOR).map_err(|err| {
            HotelSearchError::Extractor(format!("invalid card selector: {err}"))
        })?;
        let price = PRICE_SELECTORS
            .iter()
            .map(|css| CssText::parse(css).map(|e| Box::new(e) as Box<dyn FieldExtractor>))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_fields(
            card,
            Box::new(CssText::parse(NAME_SELECTOR)?),
            Box::new(CssText::parse(RATING_SELECTOR)?),
            Box::new(FirstOf::new(price)),
        ))
    }

    pub fn with_fields(
        card: Selector,
        name: Box<dyn FieldExtractor>,
        rating: Box<dyn FieldExtractor>,
        price: Box<dyn FieldExtractor>,
    ) -> Self {
        Self {
            card,
            name,
            rating,
            price,
        }
    }

    pub fn extract_card(&self, card: ElementRef<'_>, nights: u32) -> HotelOffer {
        let name = self
            .name
            .extract(card)
            .unwrap_or_else(|| UNNAMED_HOTEL.to_string());
        let rating = self.rating.extract(card);
        let total_price = self.price.extract(card).as_deref().and_then(parse_price);

        HotelOffer::new(name, rating, total_price, nights)
    }

    /// Extracts every card on the page, in page order.
    pub fn extract_document(&self, html: &str, nights: u32) -> HotelSearchOutcome {
        let document = Html::parse_document(html);
        let offers: Vec<HotelOffer> = document
            .select(&self.card)
            .map(|card| self.extract_card(card, nights))
            .collect();

        debug!(
            cards = offers.len(),
            unnamed = offers.iter().filter(|o| o.name == UNNAMED_HOTEL).count(),
            unpriced = offers.iter().filter(|o| o.total_price.is_none()).count(),
            "extracted hotel cards"
        );
        HotelSearchOutcome::from_offers(offers)
    }
}
