use std::fmt::Write as _;

use crate::hotels::offer::{HotelOffer, format_usd};
use crate::hotels::ranking::top;
use crate::hotels::{HotelSearch, HotelSearchOutcome};

pub const NO_HOTELS_FOUND: &str = "No hotels found.";
const HEADERS: [&str; 4] = ["Name", "Rating", "Total Price", "Price per Night"];

fn row(offer: &HotelOffer) -> [String; 4] {
    [
        offer.name.clone(),
        offer.rating_label().to_string(),
        format_usd(offer.total_amount()),
        offer
            .per_night_price
            .map(format_usd)
            .unwrap_or_else(|| "n/a".to_string()),
    ]
}

/// Renders the first [`crate::hotels::ranking::DISPLAY_LIMIT`] offers as a table.
pub fn render_table(offers: &[HotelOffer]) -> String {
    let rows: Vec<[String; 4]> = top(offers).iter().map(row).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_line(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for cells in &rows {
        write_line(&mut out, cells, &widths);
    }
    out
}

fn write_line(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (cell, width))| {
            let pad = width.saturating_sub(cell.chars().count());
            // prices are right-aligned
            if idx >= 2 {
                format!("{}{}", " ".repeat(pad), cell)
            } else {
                format!("{}{}", cell, " ".repeat(pad))
            }
        })
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

pub fn render_outcome(outcome: &HotelSearchOutcome) -> String {
    match outcome {
        HotelSearchOutcome::Found(offers) => render_table(offers),
        HotelSearchOutcome::NoHotelsFound => format!("{NO_HOTELS_FOUND}\n"),
    }
}

pub fn render_search(search: &HotelSearch) -> String {
    let query = &search.query;
    format!(
        "Top hotels in {} - {} for {} night{}\n{}",
        title_case(&query.city),
        query.checkin.format("%Y/%m/%d"),
        query.nights,
        if query.nights == 1 { "" } else { "s" },
        render_outcome(&search.outcome)
    )
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
