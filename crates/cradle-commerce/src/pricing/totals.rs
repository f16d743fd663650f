//! Final payable total.
//!
//! The one function that turns subtotal, VAT, and discount into the amount
//! charged. Cart display and checkout submission both call it, so the two
//! can never disagree on a cent.

use crate::error::CommerceError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Which base VAT is computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaxBase {
    /// VAT on the undiscounted subtotal. The storefront's policy: a
    /// discount reduces what the shopper pays, not the taxable base.
    #[default]
    PreDiscount,
    /// VAT on the subtotal after discounts, for jurisdictions that tax the
    /// discounted price.
    PostDiscount,
}

/// Pricing policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    /// VAT rate as a fraction, e.g. 0.05 for 5%.
    pub vat_rate: f64,
    /// Which base the VAT applies to.
    pub tax_base: TaxBase,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vat_rate: 0.05,
            tax_base: TaxBase::PreDiscount,
        }
    }
}

/// The cart's final numbers, as displayed and as charged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CartTotals {
    /// Subtotal before discounts and tax.
    pub subtotal: Money,
    /// VAT amount.
    pub vat_amount: Money,
    /// Total discount.
    pub discount_total: Money,
    /// `max(0, subtotal + vat - discount)`.
    pub grand_total: Money,
}

/// Combine subtotal, VAT, and discount into the payable total.
pub fn compute_totals(
    subtotal: Money,
    discount_total: Money,
    config: &PricingConfig,
) -> Result<CartTotals, CommerceError> {
    let taxable = match config.tax_base {
        TaxBase::PreDiscount => subtotal,
        TaxBase::PostDiscount => subtotal
            .try_subtract(&discount_total)
            .ok_or(CommerceError::Overflow)?
            .clamp_non_negative(),
    };
    let vat_amount = taxable.percentage(config.vat_rate * 100.0);

    let grand_total = subtotal
        .try_add(&vat_amount)
        .ok_or(CommerceError::Overflow)?
        .try_subtract(&discount_total)
        .ok_or(CommerceError::Overflow)?
        .clamp_non_negative();

    Ok(CartTotals {
        subtotal,
        vat_amount,
        discount_total,
        grand_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    #[test]
    fn vat_is_computed_on_the_pre_discount_subtotal() {
        // $200 cart, $20 discount, 5% VAT on $200 = $10, total $190.
        let totals = compute_totals(usd(20000), usd(2000), &PricingConfig::default()).unwrap();
        assert_eq!(totals.vat_amount.cents, 1000);
        assert_eq!(totals.grand_total.cents, 19000);
    }

    #[test]
    fn post_discount_base_is_a_config_change() {
        let config = PricingConfig {
            vat_rate: 0.05,
            tax_base: TaxBase::PostDiscount,
        };
        // VAT on $180 = $9, total $189.
        let totals = compute_totals(usd(20000), usd(2000), &config).unwrap();
        assert_eq!(totals.vat_amount.cents, 900);
        assert_eq!(totals.grand_total.cents, 18900);
    }

    #[test]
    fn grand_total_clamps_at_zero() {
        let config = PricingConfig {
            vat_rate: 0.0,
            tax_base: TaxBase::PreDiscount,
        };
        let totals = compute_totals(usd(1000), usd(5000), &config).unwrap();
        assert_eq!(totals.grand_total.cents, 0);
    }

    #[test]
    fn zero_vat_rate() {
        let config = PricingConfig {
            vat_rate: 0.0,
            tax_base: TaxBase::PreDiscount,
        };
        let totals = compute_totals(usd(10000), usd(0), &config).unwrap();
        assert!(totals.vat_amount.is_zero());
        assert_eq!(totals.grand_total.cents, 10000);
    }
}
