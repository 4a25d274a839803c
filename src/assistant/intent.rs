//! Classifies one line of user input.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::hotels::SortOrder;

pub const HOTEL_USAGE: &str = "Try something like: cheapest hotels in Lisbon for 3 nights";
pub const FLIGHT_USAGE: &str = "Try something like: flights from Paris to Rome on 2026-11-15";

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];
const PRICE_WORDS: [&str; 3] = ["cheap", "lowest", "price"];
const RATING_WORDS: [&str; 4] = ["top rated", "best rated", "highest", "rating"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotelRequest {
    pub city: String,
    pub sort: Option<SortOrder>,
    pub nights: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRequest {
    pub origin: String,
    pub destination: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sort(SortOrder),
    Results,
    Nights(u32),
    Checkin(NaiveDate),
    History,
    Reset,
    Help,
    /// Recognized command with bad arguments; carries the message to show.
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Exit,
    Command(Command),
    Hotel(HotelRequest),
    Flight(FlightRequest),
    /// A trigger phrase was seen but could not be parsed.
    Usage(&'static str),
    Chat(String),
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("intent pattern is a valid regex"))
}

fn in_word() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)\bin\b")
}

fn city_after_in() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    // greedy prefix: the last " in " wins
    regex(&CELL, r"(?i)^.*\bin\s+(.+)$")
}

fn trailing_clause() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(
        &CELL,
        r"(?i)(?:\s*,|\s+(?:for\s+\d+\s+nights?|sorted|sort|by\s+(?:price|rating)|with|please|near|cheap(?:est|er)?|lowest|prices?|top\s+rated|best\s+rated|highest|rating)\b).*$",
    )
}

fn nights_clause() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, r"(?i)\bfor\s+(\d+)\s+nights?\b")
}

fn flight_route() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(
        &CELL,
        r"(?i)\bfrom\s+(.+?)\s+to\s+(.+?)(?:\s+on\s+(\d{4}-\d{2}-\d{2}))?$",
    )
}

fn strip_punctuation(text: &str) -> &str {
    text.trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '.' | '!' | ','))
        .trim()
}

fn sort_preference(lowered: &str) -> Option<SortOrder> {
    if PRICE_WORDS.iter().any(|word| lowered.contains(word)) {
        Some(SortOrder::PriceAscending)
    } else if RATING_WORDS.iter().any(|word| lowered.contains(word)) {
        Some(SortOrder::RatingDescending)
    } else {
        None
    }
}

fn parse_hotel(text: &str, lowered: &str) -> Intent {
    let Some(captures) = city_after_in().captures(text) else {
        return Intent::Usage(HOTEL_USAGE);
    };
    let raw_city = strip_punctuation(&captures[1]);
    let city = strip_punctuation(&trailing_clause().replace(raw_city, "")).to_string();
    if city.is_empty() {
        return Intent::Usage(HOTEL_USAGE);
    }

    let nights = nights_clause()
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .filter(|n| *n > 0);

    Intent::Hotel(HotelRequest {
        city,
        sort: sort_preference(lowered),
        nights,
    })
}

/// `None` when the text has no "from X to Y" route at all.
fn parse_flight(text: &str) -> Option<Intent> {
    let captures = flight_route().captures(strip_punctuation(text))?;
    let date = match captures.get(3) {
        Some(raw) => match NaiveDate::parse_from_str(raw.as_str(), "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => return Some(Intent::Usage(FLIGHT_USAGE)),
        },
        None => None,
    };

    Some(Intent::Flight(FlightRequest {
        origin: strip_punctuation(&captures[1]).to_string(),
        destination: strip_punctuation(&captures[2]).to_string(),
        date,
    }))
}

fn parse_command(text: &str) -> Command {
    let mut parts = text.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next().map(str::to_ascii_lowercase);

    match (name.as_str(), arg.as_deref()) {
        ("/sort", Some("price")) => Command::Sort(SortOrder::PriceAscending),
        ("/sort", Some("rating")) => Command::Sort(SortOrder::RatingDescending),
        ("/sort", _) => Command::Invalid("usage: /sort price | /sort rating".to_string()),
        ("/results", _) => Command::Results,
        ("/nights", Some(raw)) => match raw.parse::<u32>() {
            Ok(nights) if nights > 0 => Command::Nights(nights),
            _ => Command::Invalid(format!("'{raw}' is not a positive number of nights")),
        },
        ("/nights", None) => Command::Invalid("usage: /nights N".to_string()),
        ("/checkin", Some(raw)) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Command::Checkin(date),
            Err(_) => Command::Invalid(format!("'{raw}' is not a date (use YYYY-MM-DD)")),
        },
        ("/checkin", None) => Command::Invalid("usage: /checkin YYYY-MM-DD".to_string()),
        ("/history", _) => Command::History,
        ("/reset", _) => Command::Reset,
        ("/help", _) => Command::Help,
        (other, _) => Command::Invalid(format!("unknown command '{other}' (try /help)")),
    }
}

pub fn classify(input: &str) -> Intent {
    let text = input.trim();
    let lowered = text.to_lowercase();

    if EXIT_WORDS.contains(&lowered.as_str()) {
        return Intent::Exit;
    }
    if text.starts_with('/') {
        return Intent::Command(parse_command(text));
    }
    let mentions_flight = lowered.contains("flight");
    if mentions_flight {
        if let Some(intent) = parse_flight(text) {
            return intent;
        }
    }
    if lowered.contains("hotel") && in_word().is_match(text) {
        return parse_hotel(text, &lowered);
    }
    if mentions_flight {
        return Intent::Usage(FLIGHT_USAGE);
    }
    Intent::Chat(text.to_string())
}
