use std::cmp::Ordering;

use crate::hotels::offer::HotelOffer;

/// Number of offers shown after sorting.
pub const DISPLAY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Cheapest first; offers without a price go last.
    PriceAscending,
    /// Best rated first; offers without a score rank as `0.0`.
    RatingDescending,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PriceAscending => "price (lowest first)",
            Self::RatingDescending => "rating (highest first)",
        }
    }
}

fn price_key(offer: &HotelOffer) -> f64 {
    offer.total_price.unwrap_or(f64::INFINITY)
}

fn rating_key(offer: &HotelOffer) -> f64 {
    offer.rating_score().unwrap_or(0.0)
}

fn compare(order: SortOrder, a: &HotelOffer, b: &HotelOffer) -> Ordering {
    match order {
        SortOrder::PriceAscending => price_key(a).total_cmp(&price_key(b)),
        SortOrder::RatingDescending => rating_key(b).total_cmp(&rating_key(a)),
    }
}

/// Stable in-place sort.
pub fn sort_offers(offers: &mut [HotelOffer], order: SortOrder) {
    offers.sort_by(|a, b| compare(order, a, b));
}

pub fn top(offers: &[HotelOffer]) -> &[HotelOffer] {
    &offers[..offers.len().min(DISPLAY_LIMIT)]
}

#[cfg(test)]
mod tests {
    use super::{DISPLAY_LIMIT, SortOrder, sort_offers, top};
    use crate::hotels::offer::HotelOffer;

    fn offer(name: &str, rating: Option<&str>, price: Option<f64>) -> HotelOffer {
        HotelOffer::new(name, rating.map(str::to_string), price, 2)
    }

    fn names(offers: &[HotelOffer]) -> Vec<&str> {
        offers.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn price_sort_puts_missing_prices_last() {
        let mut offers = vec![
            offer("no price", Some("9.0"), None),
            offer("pricey", None, Some(400.0)),
            offer("cheap", None, Some(80.0)),
        ];
        sort_offers(&mut offers, SortOrder::PriceAscending);
        assert_eq!(names(&offers), ["cheap", "pricey", "no price"]);
    }

    #[test]
    fn price_sort_is_stable_for_equal_prices() {
        let mut offers = vec![
            offer("first", None, Some(100.0)),
            offer("cheap", None, Some(50.0)),
            offer("second", None, Some(100.0)),
            offer("third", None, Some(100.0)),
        ];
        sort_offers(&mut offers, SortOrder::PriceAscending);
        assert_eq!(names(&offers), ["cheap", "first", "second", "third"]);
    }

    #[test]
    fn rating_sort_puts_missing_ratings_last() {
        let mut offers = vec![
            offer("unrated", None, Some(10.0)),
            offer("good", Some("8.1"), Some(10.0)),
            offer("garbled", Some("n/a"), Some(10.0)),
            offer("great", Some("9.4"), Some(10.0)),
        ];
        sort_offers(&mut offers, SortOrder::RatingDescending);
        assert_eq!(names(&offers), ["great", "good", "unrated", "garbled"]);
    }

    #[test]
    fn rating_sort_is_stable_for_equal_scores() {
        let mut offers = vec![
            offer("a", Some("8.0"), None),
            offer("b", Some("8.0"), None),
            offer("c", Some("9.0"), None),
        ];
        sort_offers(&mut offers, SortOrder::RatingDescending);
        assert_eq!(names(&offers), ["c", "a", "b"]);
    }

    #[test]
    fn worked_example_keeps_order_under_both_sorts() {
        let original = vec![
            offer("Hotel A", Some("8.5"), Some(120.0)),
            offer("Hotel B", None, None),
        ];

        let mut by_price = original.clone();
        sort_offers(&mut by_price, SortOrder::PriceAscending);
        assert_eq!(by_price, original);

        let mut by_rating = original.clone();
        sort_offers(&mut by_rating, SortOrder::RatingDescending);
        assert_eq!(by_rating, original);
    }

    #[test]
    fn top_truncates_to_display_limit() {
        let offers: Vec<HotelOffer> = (0..8)
            .map(|i| offer(&format!("h{i}"), None, Some(f64::from(i))))
            .collect();
        assert_eq!(top(&offers).len(), DISPLAY_LIMIT);
        assert_eq!(top(&offers[..3]).len(), 3);
    }
}
