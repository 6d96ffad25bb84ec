//! Allocation of human-readable beneficiary identifiers of the form
//! `ISM/B2-<YY>/<LGA INITIALS>/<NNNN>`.
//!
//! The serial is never stored on its own: it is derived from the greatest
//! identifier already issued for the year, inside the create transaction.

use lazy_static::lazy_static;
use regex::Regex;

pub const PROGRAMME_PREFIX: &str = "ISM/B2";
const SERIAL_WIDTH: usize = 4;

/// First letter of every whitespace-separated word, upper-cased.
pub fn lga_initials(lga: &str) -> String {
    lga.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Prefix shared by every identifier issued in `year` (two-digit form).
///
/// Lookups of the last issued identifier are scoped by this prefix only, so
/// all LGAs of a year draw from one serial sequence.
pub fn year_prefix(year: i32) -> String {
    format!("{PROGRAMME_PREFIX}-{:02}/", year.rem_euclid(100))
}

pub fn format_user_id(year: i32, initials: &str, serial: u32) -> String {
    format!(
        "{}{}/{:0width$}",
        year_prefix(year),
        initials,
        serial,
        width = SERIAL_WIDTH
    )
}

/// Trailing numeric segment of an identifier.
pub fn parse_serial(user_id: &str) -> Option<u32> {
    lazy_static! {
        static ref SERIAL_RE: Regex = Regex::new(r"/(\d+)$").unwrap();
    }
    SERIAL_RE
        .captures(user_id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// Serial that follows `last`, or 1 when nothing was issued yet.
pub fn next_serial(last: Option<&str>) -> anyhow::Result<u32> {
    match last {
        None => Ok(1),
        Some(id) => {
            let serial = parse_serial(id)
                .ok_or_else(|| anyhow::anyhow!("stored user id {id:?} has no numeric serial"))?;
            serial
                .checked_add(1)
                .ok_or_else(|| anyhow::anyhow!("serial after {id:?} overflows"))
        }
    }
}

/// Identifier for a new record given the last one issued this year.
pub fn next_user_id(last: Option<&str>, year: i32, lga: &str) -> anyhow::Result<String> {
    let serial = next_serial(last)?;
    Ok(format_user_id(year, &lga_initials(lga), serial))
}
