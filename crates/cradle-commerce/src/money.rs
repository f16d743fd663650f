//! Money type for cart and discount arithmetic.
//!
//! Amounts are stored in the smallest currency unit (cents for USD) as an
//! `i64`, so everything the shopper sees is already rounded to the precision
//! that will be charged. Percentage math rounds half-up at the cent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies the storefront prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    JPY,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::JPY => "JPY",
        }
    }

    /// Display symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "\u{20ac}",
            Currency::GBP => "\u{00a3}",
            Currency::CAD => "CA$",
            Currency::AUD => "A$",
            Currency::JPY => "\u{00a5}",
        }
    }

    /// Minor-unit digits (JPY has none).
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Parse an ISO code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "USD" => Some(Currency::USD),
            "EUR" => Some(Currency::EUR),
            "GBP" => Some(Currency::GBP),
            "CAD" => Some(Currency::CAD),
            "AUD" => Some(Currency::AUD),
            "JPY" => Some(Currency::JPY),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A monetary amount in a currency's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Money {
    /// Amount in minor units (e.g. cents).
    pub cents: i64,
    /// The currency of the amount.
    pub currency: Currency,
}

impl Money {
    /// Build from minor units.
    pub fn new(cents: i64, currency: Currency) -> Self {
        Self { cents, currency }
    }

    /// Build from a major-unit decimal, rounding half-up at the minor unit.
    ///
    /// ```
    /// use cradle_commerce::money::{Currency, Money};
    /// assert_eq!(Money::from_decimal(49.99, Currency::USD).cents, 4999);
    /// ```
    pub fn from_decimal(amount: f64, currency: Currency) -> Self {
        let scale = 10_i64.pow(currency.decimal_places()) as f64;
        Self::new((amount * scale).round() as i64, currency)
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Major-unit decimal value, for interop with wire formats.
    pub fn to_decimal(&self) -> f64 {
        let scale = 10_i64.pow(self.currency.decimal_places()) as f64;
        self.cents as f64 / scale
    }

    /// Checked addition; `None` on currency mismatch or overflow.
    pub fn try_add(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        Some(Money::new(self.cents.checked_add(other.cents)?, self.currency))
    }

    /// Checked subtraction; `None` on currency mismatch or overflow.
    pub fn try_subtract(&self, other: &Money) -> Option<Money> {
        if self.currency != other.currency {
            return None;
        }
        Some(Money::new(self.cents.checked_sub(other.cents)?, self.currency))
    }

    /// Checked scalar multiplication (e.g. unit price × quantity).
    pub fn try_multiply(&self, factor: i64) -> Option<Money> {
        Some(Money::new(self.cents.checked_mul(factor)?, self.currency))
    }

    /// Checked sum over an iterator; `None` if any element mismatches or the
    /// running total overflows.
    pub fn try_sum<'a>(iter: impl Iterator<Item = &'a Money>, currency: Currency) -> Option<Money> {
        let mut total = Money::zero(currency);
        for m in iter {
            total = total.try_add(m)?;
        }
        Some(total)
    }

    /// A percentage of this amount, rounded half-up at the cent.
    pub fn percentage(&self, percent: f64) -> Money {
        let raw = self.cents as f64 * percent / 100.0;
        Money::new(raw.round() as i64, self.currency)
    }

    /// Same-currency comparison; `None` when currencies differ, so minor
    /// units of different currencies never compare silently.
    pub fn try_cmp(&self, other: &Money) -> Option<std::cmp::Ordering> {
        (self.currency == other.currency).then(|| self.cents.cmp(&other.cents))
    }

    /// The smaller of two same-currency amounts.
    pub fn min(&self, other: &Money) -> Money {
        if other.cents < self.cents { *other } else { *self }
    }

    /// Clamp a negative amount up to zero.
    pub fn clamp_non_negative(&self) -> Money {
        Money::new(self.cents.max(0), self.currency)
    }

    /// Split this amount proportionally to `weights` using largest-remainder
    /// allocation, so the shares always sum back to the original amount with
    /// no cent lost or invented. Non-positive weight totals yield all zeros.
    pub fn allocate(&self, weights: &[i64]) -> Vec<Money> {
        if weights.is_empty() {
            return Vec::new();
        }
        let weight_total: i128 = weights.iter().map(|w| *w as i128).sum();
        if weight_total <= 0 {
            return vec![Money::zero(self.currency); weights.len()];
        }

        let amount = self.cents as i128;
        let mut shares: Vec<(usize, i64, i128)> = Vec::with_capacity(weights.len());
        let mut assigned: i128 = 0;
        for (index, weight) in weights.iter().enumerate() {
            let exact = amount * (*weight).max(0) as i128;
            let floor = exact.div_euclid(weight_total);
            assigned += floor;
            shares.push((index, floor as i64, exact.rem_euclid(weight_total)));
        }

        // Hand leftover cents to the largest remainders, earliest line first.
        let mut leftover = (amount - assigned) as i64;
        shares.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        for share in shares.iter_mut() {
            if leftover == 0 {
                break;
            }
            share.1 += 1;
            leftover -= 1;
        }

        shares.sort_by_key(|share| share.0);
        shares
            .into_iter()
            .map(|(_, cents, _)| Money::new(cents, self.currency))
            .collect()
    }

    /// Display string with symbol, e.g. "$49.99".
    pub fn display(&self) -> String {
        let places = self.currency.decimal_places() as usize;
        format!("{}{:.places$}", self.currency.symbol(), self.to_decimal())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
