//! Cell formats shared by every sheet
//!
//! Spreadsheets hand us text (or numbers that used to be text), so all
//! parsing here is lenient: anything unreadable becomes `None` and the caller
//! decides whether that matters.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serializer;

/// Timestamp format used for CreatedAt and activity Timestamp cells
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format used for KYC submission dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp cell, tolerating ISO `T` separators and fractional seconds
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
}

/// Parse a decimal cell, accepting scientific notation written by older tools
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Render a decimal without trailing zeros ("1500.50" -> "1500.5")
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Parse a whole-number cell; "3.0" reads as 3
pub fn parse_u32(s: &str) -> Option<u32> {
    let s = s.trim();
    s.parse::<u32>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u32))
}

/// Parse a 0/1 flag cell
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "1" | "1.0" | "true" | "yes" => Some(true),
        _ => Some(false),
    }
}

pub fn format_flag(flag: bool) -> String {
    if flag { "1" } else { "0" }.to_string()
}

/// Canonical form of an account number: trimmed, without a ".0"-style suffix
///
/// Workbooks that stored account numbers as numbers hand them back as floats.
pub fn normalize_account_number(s: &str) -> String {
    let trimmed = s.trim();
    trimmed
        .split('.')
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

/// Canonical form of an IFSC code: trimmed and uppercased
pub fn normalize_ifsc(s: &str) -> String {
    s.trim().to_uppercase()
}

pub(crate) mod opt_timestamp {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_str(""),
        }
    }
}

/// Flags go over the wire as 0/1, the way the sheet stores them
pub(crate) fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

pub(crate) fn serialize_opt_flag<S: Serializer>(
    flag: &Option<bool>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match flag {
        Some(f) => serialize_flag(f, serializer),
        None => serializer.serialize_none(),
    }
}
