//! Field validation for lifecycle requests
//!
//! Pure, stateless checks. Each `validate_*` function returns the complete list
//! of violated rules in declaration order (card number, expiry, CVV, currency,
//! amount, transaction id); an empty list means the request is structurally
//! valid. Requests are expected to be whitespace-normalised beforehand.

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;
use uuid::{Uuid, Variant};

use crate::types::{
    AuthorizeRequest, CaptureRequest, ExpiryDate, RefundRequest, Violation, VoidRequest,
};

static CARD_NUMBER_LAYOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("Invalid card number regex"));

static CVV_LAYOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3,4}$").expect("Invalid cvv regex"));

/// ISO 4217 shaped; the code itself is not checked against a list
static CURRENCY_LAYOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("Invalid currency regex"));

/// Check a card number with the Luhn checksum
pub fn is_card_number_valid(number: &str) -> bool {
    CARD_NUMBER_LAYOUT.is_match(number) && luhn::valid(number)
}

/// Check that an `MM-YYYY` expiry parses and is not before the current month
pub fn is_expiry_valid(expiry: &str, now: DateTime<Utc>) -> bool {
    expiry
        .parse::<ExpiryDate>()
        .map(|expiry| !expiry.is_expired_at(now))
        .unwrap_or(false)
}

pub fn is_cvv_valid(cvv: &str) -> bool {
    CVV_LAYOUT.is_match(cvv)
}

pub fn is_currency_valid(currency: &str) -> bool {
    CURRENCY_LAYOUT.is_match(currency)
}

/// Strictly positive
pub fn is_amount_valid(amount: Decimal) -> bool {
    amount > Decimal::ZERO
}

/// Parse a canonical, hyphenated UUID v4
///
/// Other textual forms the `uuid` crate accepts (simple, braced, URN) and other
/// versions or variants are refused.
pub fn parse_transaction_id(value: &str) -> Option<Uuid> {
    if value.len() != 36 {
        return None;
    }
    let id = Uuid::try_parse(value).ok()?;
    if id.get_version_num() == 4 && id.get_variant() == Variant::RFC4122 {
        Some(id)
    } else {
        None
    }
}

pub fn validate_authorize(request: &AuthorizeRequest, now: DateTime<Utc>) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !is_card_number_valid(&request.card.number) {
        violations.push(Violation::InvalidCardNumber);
    }
    if !is_expiry_valid(&request.card.expiry_date, now) {
        violations.push(Violation::InvalidExpiryDate);
    }
    if !is_cvv_valid(&request.card.cvv) {
        violations.push(Violation::InvalidCvv);
    }
    if !is_currency_valid(&request.currency) {
        violations.push(Violation::InvalidCurrency);
    }
    if !is_amount_valid(request.amount) {
        violations.push(Violation::InvalidAmount);
    }

    violations
}

pub fn validate_capture(request: &CaptureRequest) -> Vec<Violation> {
    validate_amount_and_id(request.amount, &request.transaction_id)
}

pub fn validate_refund(request: &RefundRequest) -> Vec<Violation> {
    validate_amount_and_id(request.amount, &request.transaction_id)
}

pub fn validate_void(request: &VoidRequest) -> Vec<Violation> {
    if parse_transaction_id(&request.transaction_id).is_some() {
        Vec::new()
    } else {
        vec![Violation::InvalidTransactionId]
    }
}

fn validate_amount_and_id(amount: Decimal, transaction_id: &str) -> Vec<Violation> {
    let mut violations = Vec::new();

    if !is_amount_valid(amount) {
        violations.push(Violation::InvalidAmount);
    }
    if parse_transaction_id(transaction_id).is_none() {
        violations.push(Violation::InvalidTransactionId);
    }

    violations
}
