//! Request validation: turns loosely-typed JSON drafts into checked values.
//!
//! The engine trusts its inputs, so everything client-supplied passes
//! through here first. Error messages are the exact strings the API
//! returns to clients.

use std::fmt;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::limits::*;
use crate::model::{DateSpan, RoomId};

/// Room payload as received, before any checking.
#[derive(Debug, Deserialize)]
pub struct RoomDraft {
    pub description: Option<String>,
    pub price_per_night: Option<Value>,
}

/// Booking payload as received, before any checking.
#[derive(Debug, Deserialize)]
pub struct BookingDraft {
    pub room_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    MissingField(&'static str),
    InvalidDateFormat(String),
    InvalidRange,
    PastDate,
    InvalidPrice(&'static str),
    NonPositivePrice,
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidateError::MissingField(field) => write!(f, "{field} is required"),
            ValidateError::InvalidDateFormat(detail) => {
                write!(f, "Invalid date format: {detail}")
            }
            ValidateError::InvalidRange => write!(f, "end_date must be after start_date"),
            ValidateError::PastDate => write!(f, "Cannot book in the past"),
            ValidateError::InvalidPrice(msg) => write!(f, "{msg}"),
            ValidateError::NonPositivePrice => write!(f, "price_per_night must be positive"),
        }
    }
}

impl std::error::Error for ValidateError {}

/// Checks a room draft and yields `(description, price_cents)`.
pub fn validate_room(draft: RoomDraft) -> Result<(String, i64), ValidateError> {
    let description = match draft.description {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ValidateError::MissingField("description")),
    };
    let price_cents = match &draft.price_per_night {
        Some(value) => parse_price(value)?,
        None => return Err(ValidateError::MissingField("price_per_night")),
    };
    Ok((description, price_cents))
}

/// Checks a booking draft against `today` and yields `(room_id, span)`.
///
/// Order matters: required fields, then date syntax, then range, then
/// the past-date rule. The first failure wins.
pub fn validate_booking(
    draft: BookingDraft,
    today: NaiveDate,
) -> Result<(RoomId, DateSpan), ValidateError> {
    let room_id = draft.room_id.ok_or(ValidateError::MissingField("room_id"))?;
    let start = parse_date(draft.start_date.as_deref(), "start_date")?;
    let end = parse_date(draft.end_date.as_deref(), "end_date")?;
    if start >= end {
        return Err(ValidateError::InvalidRange);
    }
    if start < today {
        return Err(ValidateError::PastDate);
    }
    Ok((room_id, DateSpan::new(start, end)))
}

// Absent is a missing field; any present string, "" included, goes to the
// parser and reports as a format error.
fn parse_date(raw: Option<&str>, field: &'static str) -> Result<NaiveDate, ValidateError> {
    let raw = raw.ok_or(ValidateError::MissingField(field))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ValidateError::InvalidDateFormat(e.to_string()))
}

/// Parses a price into integer cents. Accepts a JSON string or number;
/// at most [`MAX_PRICE_INT_DIGITS`] integer digits and
/// [`PRICE_FRACTION_DIGITS`] fraction digits, strictly positive.
fn parse_price(value: &Value) -> Result<i64, ValidateError> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(ValidateError::InvalidPrice(
                "price_per_night must be a decimal number",
            ))
        }
    };
    if text.is_empty() {
        return Err(ValidateError::MissingField("price_per_night"));
    }

    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(&text)),
    };
    let (int_part, frac_part) = match magnitude.split_once('.') {
        Some((i, f)) => (i, f),
        None => (magnitude, ""),
    };

    let all_digits =
        |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    // ".50" and "120." are fine, a bare "." or "" is not
    if !(all_digits(int_part) || int_part.is_empty())
        || !(all_digits(frac_part) || frac_part.is_empty())
        || (int_part.is_empty() && frac_part.is_empty())
    {
        return Err(ValidateError::InvalidPrice(
            "price_per_night must be a decimal number",
        ));
    }
    if frac_part.len() > PRICE_FRACTION_DIGITS {
        return Err(ValidateError::InvalidPrice(
            "price_per_night must have at most 2 decimal places",
        ));
    }
    let significant = int_part.trim_start_matches('0');
    if significant.len() > MAX_PRICE_INT_DIGITS {
        return Err(ValidateError::InvalidPrice("price_per_night too large"));
    }

    let frac_cents = match frac_part.len() {
        0 => 0,
        1 => digits_value(frac_part) * 10,
        _ => digits_value(frac_part),
    };
    let cents = digits_value(significant) * 100 + frac_cents;
    if negative || cents == 0 {
        return Err(ValidateError::NonPositivePrice);
    }
    Ok(cents)
}

// Caller guarantees all-ASCII-digit input short enough not to overflow.
fn digits_value(s: &str) -> i64 {
    s.bytes().fold(0, |acc, b| acc * 10 + i64::from(b - b'0'))
}

/// Renders cents back into the `"123.45"` form the API serves.
pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
