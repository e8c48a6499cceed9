//! Card-related types
//!
//! Card expiry is handled at month granularity: a card expiring in the
//! current month is still valid.

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static EXPIRY_LAYOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])-([0-9]{4})$").expect("Invalid expiry regex")
});

/// Card expiry month/year, written `MM-YYYY`
///
/// Field order gives the derived ordering (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpiryDate {
    year: i32,
    month: u32,
}

impl ExpiryDate {
    /// Build an expiry from a month (1-12) and a year
    pub fn new(month: u32, year: i32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(ExpiryDate { year, month })
        } else {
            None
        }
    }

    /// The month containing the given instant
    pub fn month_of(now: DateTime<Utc>) -> Self {
        ExpiryDate {
            year: now.year(),
            month: now.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Whether the card is strictly before the month containing `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        *self < ExpiryDate::month_of(now)
    }
}

impl FromStr for ExpiryDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = EXPIRY_LAYOUT
            .captures(s)
            .ok_or_else(|| format!("Expiry '{}' is not in MM-YYYY format", s))?;

        let month: u32 = captures[1]
            .parse()
            .map_err(|_| format!("Invalid expiry month in '{}'", s))?;
        let year: i32 = captures[2]
            .parse()
            .map_err(|_| format!("Invalid expiry year in '{}'", s))?;

        ExpiryDate::new(month, year).ok_or_else(|| format!("Invalid expiry month in '{}'", s))
    }
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

/// Card details as supplied with an authorisation request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardDetails {
    pub number: String,
    /// `MM-YYYY`
    pub expiry_date: String,
    pub cvv: String,
}

impl CardDetails {
    /// Remove all whitespace from every field
    pub fn normalized(self) -> Self {
        CardDetails {
            number: strip_whitespace(&self.number),
            expiry_date: strip_whitespace(&self.expiry_date),
            cvv: strip_whitespace(&self.cvv),
        }
    }

    /// Card number reduced to its last four digits, for output
    pub fn mask(number: &str) -> String {
        let digits: Vec<char> = number.chars().collect();
        if digits.len() <= 4 {
            return number.to_string();
        }
        let tail: String = digits[digits.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(digits.len() - 4), tail)
    }
}

/// Remove every whitespace character from a string
pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}
