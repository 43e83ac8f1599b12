//! Cleanup of free-form text read from the detail overlay.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::Field;

static DOLLAR_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d[\d,]*").expect("valid dollar regex"));
static BARE_AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("valid amount regex"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number regex"));
static SALE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("valid date regex"));

/// Blank text and the portal's own "n/a" / "na" placeholders
fn is_placeholder(raw: &str) -> bool {
    let trimmed = raw.trim().to_lowercase();
    trimmed.is_empty() || trimmed == "n/a" || trimmed == "na"
}

/// Pull a dollar amount out of `raw`.
///
/// `"Est. $1,250,000 approx"` gives `"$1,250,000"`; a bare `"1,250,000"`
/// gets a `$` prefix. Decimals are not kept.
pub fn normalize_currency(raw: &str) -> Field {
    if is_placeholder(raw) {
        return Field::Unavailable;
    }

    if let Some(m) = DOLLAR_AMOUNT_RE.find(raw) {
        return Field::value(m.as_str());
    }

    match BARE_AMOUNT_RE.find(raw) {
        Some(m) => Field::value(format!("${}", m.as_str())),
        None => Field::Unavailable,
    }
}

/// First integer or decimal number in `raw`, e.g. `"3.5 baths"` gives `"3.5"`
pub fn normalize_numeric(raw: &str) -> Field {
    if is_placeholder(raw) {
        return Field::Unavailable;
    }

    match NUMBER_RE.find(raw) {
        Some(m) => Field::value(m.as_str()),
        None => Field::Unavailable,
    }
}

/// Trimmed text, or unavailable when blank or a placeholder
pub fn normalize_text(raw: &str) -> Field {
    if is_placeholder(raw) {
        Field::Unavailable
    } else {
        Field::value(raw.trim())
    }
}

/// Split a last-sale blob such as `"$310,000 05/14/2019"` into amount and date.
///
/// Each half is independently unavailable when its pattern is absent.
pub fn split_sale_record(raw: &str) -> (Field, Field) {
    let amount = DOLLAR_AMOUNT_RE
        .find(raw)
        .map(|m| Field::value(m.as_str()))
        .unwrap_or_default();
    let date = SALE_DATE_RE
        .find(raw)
        .map(|m| Field::value(m.as_str()))
        .unwrap_or_default();
    (amount, date)
}

/// Whether `raw` begins with a decimal-or-integer token
pub fn starts_with_number(raw: &str) -> bool {
    NUMBER_RE.find(raw.trim()).is_some_and(|m| m.start() == 0)
}
