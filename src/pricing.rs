// Checkout price calculation.
// Amounts are whole currency units; fractional currency is not modeled.

use crate::forms::ValidationError;
use serde::{Deserialize, Serialize};

pub const MIN_TRAVELERS: u32 = 1;
pub const MAX_TRAVELERS: u32 = 6;

// Basis points per whole (10_000 bps == 100%)
const BPS_SCALE: i64 = 10_000;

/// Tax and discount policy applied at checkout. Defaults to 10% tax and a flat 2500 off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tax_rate_bps: u32,
    pub flat_discount: i64,
    // When false the total is allowed to go negative for small subtotals
    pub clamp_at_zero: bool,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_bps: 1_000,
            flat_discount: 2_500,
            clamp_at_zero: true,
        }
    }
}

impl PricingPolicy {
    // The policy exactly as the legacy checkout page applied it, negative totals included
    pub fn unclamped() -> Self {
        Self {
            clamp_at_zero: false,
            ..Self::default()
        }
    }

    pub fn subtotal(&self, unit_price: i64, travelers: TravelerCount) -> Result<i64, ValidationError> {
        unit_price
            .checked_mul(travelers.get() as i64)
            .ok_or_else(|| overflow(unit_price))
    }

    // round(subtotal * rate), halves rounded up
    pub fn tax(&self, subtotal: i64) -> Result<i64, ValidationError> {
        subtotal
            .checked_mul(self.tax_rate_bps as i64)
            .and_then(|scaled| scaled.checked_add(BPS_SCALE / 2))
            .map(|scaled| scaled.div_euclid(BPS_SCALE))
            .ok_or_else(|| overflow(subtotal))
    }

    pub fn discount(&self) -> i64 {
        self.flat_discount
    }

    pub fn quote(&self, unit_price: &str, travelers: TravelerCount) -> Result<PriceBreakdown, ValidationError> {
        let unit_price = parse_amount(unit_price)?;
        let subtotal = self.subtotal(unit_price, travelers)?;
        let tax = self.tax(subtotal)?;
        let discount = self.discount();

        let mut total = subtotal
            .checked_add(tax)
            .and_then(|gross| gross.checked_sub(discount))
            .ok_or_else(|| overflow(subtotal))?;
        if self.clamp_at_zero {
            total = total.max(0);
        }

        Ok(PriceBreakdown {
            unit_price,
            travelers: travelers.get(),
            subtotal,
            tax,
            discount,
            total,
        })
    }
}

fn overflow(amount: i64) -> ValidationError {
    ValidationError::InvalidPrice(format!("{} is too large to price", amount))
}

/// Traveler count bounded to the range the checkout offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TravelerCount(u32);

impl TravelerCount {
    pub fn new(count: u32) -> Result<Self, ValidationError> {
        if (MIN_TRAVELERS..=MAX_TRAVELERS).contains(&count) {
            Ok(Self(count))
        } else {
            Err(ValidationError::TravelerCount {
                count,
                max: MAX_TRAVELERS,
            })
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    // Options for the travelers selector, with their labels
    pub fn choices() -> impl Iterator<Item = (TravelerCount, String)> {
        (MIN_TRAVELERS..=MAX_TRAVELERS).map(|n| {
            let label = if n == 1 {
                "1 Person".to_string()
            } else {
                format!("{} People", n)
            };
            (TravelerCount(n), label)
        })
    }
}

impl Default for TravelerCount {
    fn default() -> Self {
        Self(MIN_TRAVELERS)
    }
}

impl TryFrom<u32> for TravelerCount {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TravelerCount> for u32 {
    fn from(count: TravelerCount) -> Self {
        count.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub unit_price: i64,
    pub travelers: u32,
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
}

/// Parses a decimal price string into whole currency units, dropping any fraction.
///
/// `"24999.00"` and `"24999"` both give 24999. Signs, empty strings and anything that
/// is not digits with an optional fractional part are rejected.
pub fn parse_amount(raw: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidPrice(raw.to_string());
    let trimmed = raw.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    whole.parse::<i64>().map_err(|_| invalid())
}

/// Groups digits the Indian way: 1234567 -> "12,34,567".
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let sign = if amount < 0 { "-" } else { "" };
    if digits.len() <= 3 {
        return format!("{}₹{}", sign, digits);
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{}₹{},{}", sign, groups.join(","), last_three)
}
