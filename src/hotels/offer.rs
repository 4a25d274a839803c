use regex::Regex;
use std::sync::OnceLock;

pub const UNNAMED_HOTEL: &str = "Unnamed Hotel";
pub const NO_RATING: &str = "No rating";

/// One hotel result as scraped from a listings page.
///
/// Missing data is kept as `None`; the fallbacks shown to users ("No rating",
/// `$0.00`) are produced by the accessors, and sort sentinels live only in
/// [`crate::hotels::ranking`].
#[derive(Debug, Clone, PartialEq)]
pub struct HotelOffer {
    pub name: String,
    /// Raw review-score text, e.g. `"8.5"`.
    pub rating: Option<String>,
    /// Parsed price for the whole stay.
    pub total_price: Option<f64>,
    /// Only set when the stay has at least one night.
    pub per_night_price: Option<f64>,
}

impl HotelOffer {
    pub fn new(
        name: impl Into<String>,
        rating: Option<String>,
        total_price: Option<f64>,
        nights: u32,
    ) -> Self {
        let mut offer = Self {
            name: name.into(),
            rating,
            total_price,
            per_night_price: None,
        };
        if nights > 0 {
            offer.per_night_price = Some(offer.total_amount() / f64::from(nights));
        }
        offer
    }

    /// Stay price, `0.0` when it could not be read.
    pub fn total_amount(&self) -> f64 {
        self.total_price.unwrap_or(0.0)
    }

    pub fn rating_label(&self) -> &str {
        self.rating.as_deref().unwrap_or(NO_RATING)
    }

    /// Numeric review score, if the rating text holds one.
    pub fn rating_score(&self) -> Option<f64> {
        self.rating.as_deref().and_then(parse_rating)
    }
}

/// A whole amount: plain digits or comma-grouped thousands, optional decimals.
fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$")
            .expect("amount pattern is a valid regex")
    })
}

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("score pattern is a valid regex"))
}

/// Reads a price like `"$1,234.50"` or `"US$ 980"`. The currency prefix,
/// whitespace and thousands separators are dropped; whatever remains must be
/// a single amount or the price is `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    let amount: String = text
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if !amount_pattern().is_match(&amount) {
        return None;
    }
    amount
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

/// Reads a review score. Accepts bare decimals and labels such as `"Scored 8.5"`.
pub fn parse_rating(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if let Ok(score) = trimmed.parse::<f64>() {
        return score.is_finite().then_some(score);
    }
    score_pattern()
        .find(trimmed)
        .and_then(|matched| matched.as_str().parse::<f64>().ok())
}

/// Formats an amount as `$#,##0.00`.
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

#[cfg(test)]
mod tests {
    use super::{HotelOffer, NO_RATING, format_usd, parse_price, parse_rating};
    use crate::hotels::ranking::{SortOrder, sort_offers};

    #[test]
    fn per_night_is_derived_from_total() {
        let offer = HotelOffer::new("Hotel A", Some("8.5".to_string()), Some(120.0), 2);
        assert_eq!(offer.per_night_price, Some(60.0));
    }

    #[test]
    fn per_night_is_unset_for_zero_nights() {
        let offer = HotelOffer::new("Hotel A", None, Some(120.0), 0);
        assert_eq!(offer.per_night_price, None);
    }

    #[test]
    fn missing_price_reads_as_zero_amount() {
        let offer = HotelOffer::new("Hotel B", None, None, 2);
        assert_eq!(offer.total_amount(), 0.0);
        assert_eq!(offer.per_night_price, Some(0.0));
        assert_eq!(offer.rating_label(), NO_RATING);
        assert_eq!(offer.rating_score(), None);
    }

    #[test]
    fn parse_price_strips_symbols_and_separators() {
        assert_eq!(parse_price("$120.00"), Some(120.0));
        assert_eq!(parse_price("US$1,234.50"), Some(1234.5));
        assert_eq!(parse_price("€ 980"), Some(980.0));
        assert_eq!(parse_price("No price"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn parse_price_rejects_text_that_is_not_one_amount() {
        assert_eq!(parse_price("2 nights US$310"), None);
        assert_eq!(parse_price("€1.234,50"), None);
        assert_eq!(parse_price("$120 per night"), None);
        assert_eq!(parse_price("$12,34"), None);
        assert_eq!(parse_price(" US$ 1,240 "), Some(1240.0));
    }

    #[test]
    fn unreadable_price_sorts_last_by_price() {
        let mut offers = vec![
            HotelOffer::new("Odd", None, parse_price("2 nights US$310"), 2),
            HotelOffer::new("Plain", None, parse_price("$450"), 2),
        ];
        sort_offers(&mut offers, SortOrder::PriceAscending);
        assert_eq!(offers[0].name, "Plain");
        assert_eq!(offers[1].total_amount(), 0.0);
    }

    #[test]
    fn parse_rating_accepts_bare_and_labelled_scores() {
        assert_eq!(parse_rating(" 8.5 "), Some(8.5));
        assert_eq!(parse_rating("Scored 9.1"), Some(9.1));
        assert_eq!(parse_rating("NaN"), None);
        assert_eq!(parse_rating(NO_RATING), None);
    }

    #[test]
    fn format_usd_groups_thousands() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(60.0), "$60.00");
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
    }
}
