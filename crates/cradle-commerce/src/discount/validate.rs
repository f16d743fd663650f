//! Coupon code validation.
//!
//! Checks a user-entered code against the eligibility rules of the matching
//! discount before it joins the active set. The `Display` text of each error
//! is the message shown to the shopper verbatim.

use crate::cart::Cart;
use crate::discount::{Discount, DiscountStatus};
use crate::error::CommerceError;
use crate::ids::DiscountId;
use crate::money::Money;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

/// Why a coupon code was rejected.
#[derive(Error, Debug, PartialEq)]
pub enum CouponError {
    /// No discount carries this code.
    #[error("Coupon code \"{0}\" was not found")]
    NotFound(String),

    /// The discount's window has not opened yet.
    #[error("Coupon \"{0}\" is not active yet")]
    NotYetActive(String),

    /// The discount's window has closed.
    #[error("Coupon \"{0}\" has expired")]
    Expired(String),

    /// The discount was switched off.
    #[error("Coupon \"{0}\" is no longer available")]
    Inactive(String),

    /// This exact code is already on the cart.
    #[error("Coupon \"{0}\" is already applied")]
    AlreadyApplied(String),

    /// Cart subtotal below the discount's minimum.
    #[error("A minimum order of {required} is needed for this coupon (cart is {subtotal})")]
    MinOrderNotMet { required: Money, subtotal: Money },

    /// Too few items in the cart.
    #[error("At least {required} items are needed for this coupon (cart has {count})")]
    MinItemsNotMet { required: i64, count: i64 },

    /// Global or per-customer redemption cap hit.
    #[error("Coupon \"{0}\" has reached its usage limit")]
    UsageLimitReached(String),

    /// Cart arithmetic failed while checking eligibility.
    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

/// Redemption counts for one customer, keyed by discount. Supplied by the
/// caller (ultimately the backend knows the truth; this mirrors it for
/// instant feedback).
#[derive(Debug, Clone, Default)]
pub struct CustomerUsage {
    counts: HashMap<DiscountId, i64>,
}

impl CustomerUsage {
    /// How often this customer has redeemed the given discount.
    pub fn count(&self, discount_id: &DiscountId) -> i64 {
        self.counts.get(discount_id).copied().unwrap_or(0)
    }

    /// Record one redemption.
    pub fn record(&mut self, discount_id: DiscountId) {
        *self.counts.entry(discount_id).or_insert(0) += 1;
    }
}

/// Validates coupon codes against a discount catalog.
#[derive(Debug)]
pub struct CouponValidator<'a> {
    discounts: &'a [Discount],
}

impl<'a> CouponValidator<'a> {
    pub fn new(discounts: &'a [Discount]) -> Self {
        Self { discounts }
    }

    /// Validate `code` for the given cart at time `now` (unix seconds).
    ///
    /// Codes compare case-insensitively; the catalog stores them uppercase.
    /// On success the matched discount is returned so the caller can add it
    /// to the active set.
    pub fn validate(
        &self,
        code: &str,
        cart: &Cart,
        customer: Option<&CustomerUsage>,
        now: i64,
    ) -> Result<&'a Discount, CouponError> {
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(CouponError::NotFound(code));
        }

        // Re-applying the active code short-circuits before any other check.
        if cart
            .coupon_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(&code))
        {
            return Err(CouponError::AlreadyApplied(code));
        }

        // Codes compare case-insensitively on both sides; the catalog is
        // supposed to publish uppercase, but the wire is not trusted to.
        let discount = self
            .discounts
            .iter()
            .find(|d| {
                d.code
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(&code))
            })
            .ok_or_else(|| CouponError::NotFound(code.clone()))?;

        if discount.is_exhausted() {
            return Err(CouponError::UsageLimitReached(code));
        }
        match discount.status(now) {
            DiscountStatus::Active => {}
            DiscountStatus::Scheduled => return Err(CouponError::NotYetActive(code)),
            DiscountStatus::Expired => return Err(CouponError::Expired(code)),
            DiscountStatus::Inactive => return Err(CouponError::Inactive(code)),
        }

        if let (Some(limit), Some(usage)) = (discount.per_customer_limit, customer) {
            if usage.count(&discount.id) >= limit {
                return Err(CouponError::UsageLimitReached(code));
            }
        }

        if let Some(required) = discount.min_order_amount {
            let subtotal = cart.subtotal()?;
            match subtotal.try_cmp(&required) {
                Some(Ordering::Less) => {
                    return Err(CouponError::MinOrderNotMet { required, subtotal });
                }
                Some(_) => {}
                None => {
                    return Err(CommerceError::CurrencyMismatch {
                        expected: subtotal.currency.code().to_string(),
                        got: required.currency.code().to_string(),
                    }
                    .into());
                }
            }
        }

        if let Some(required) = discount.min_items {
            let count = cart.item_count();
            if count < required {
                return Err(CouponError::MinItemsNotMet { required, count });
            }
        }

        Ok(discount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::discount::DiscountScope;
    use crate::ids::ProductId;
    use crate::money::Currency;

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn cart_with(cents: i64, quantity: i64) -> Cart {
        let mut cart = Cart::default();
        cart.add_line(
            CartLine::new(ProductId::new("prod-1"), "Crib Sheet", quantity, usd(cents)).unwrap(),
        )
        .unwrap();
        cart
    }

    fn save15() -> Discount {
        Discount::fixed("SAVE15", usd(1500), DiscountScope::Cart)
            .with_code("SAVE15")
            .with_min_order(usd(5000))
    }

    #[test]
    fn valid_code_returns_the_discount() {
        let discounts = vec![save15()];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 2); // $200 subtotal

        let found = validator.validate("save15", &cart, None, 0).unwrap();
        assert_eq!(found.code.as_deref(), Some("SAVE15"));
    }

    #[test]
    fn lowercase_catalog_code_still_matches() {
        // The backend is supposed to publish uppercase codes, but a
        // lowercase one must not make the coupon unreachable.
        let mut discount = save15();
        discount.code = Some("save15".into());
        let discounts = vec![discount];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 2);

        let found = validator.validate("SAVE15", &cart, None, 0).unwrap();
        assert_eq!(found.code.as_deref(), Some("save15"));
    }

    #[test]
    fn foreign_currency_minimum_is_a_mismatch() {
        let discounts = vec![Discount::fixed("Euro", usd(1500), DiscountScope::Cart)
            .with_code("EURO15")
            .with_min_order(Money::new(5000, Currency::EUR))];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 2);

        assert_eq!(
            validator.validate("EURO15", &cart, None, 0),
            Err(CouponError::Commerce(CommerceError::CurrencyMismatch {
                expected: "USD".into(),
                got: "EUR".into(),
            }))
        );
    }

    #[test]
    fn unknown_code_is_not_found() {
        let discounts = vec![save15()];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 1);

        assert_eq!(
            validator.validate("NOPE", &cart, None, 0),
            Err(CouponError::NotFound("NOPE".into()))
        );
    }

    #[test]
    fn min_order_not_met() {
        let discounts = vec![save15()];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(3000, 1); // $30 < $50 minimum

        let err = validator.validate("SAVE15", &cart, None, 0).unwrap_err();
        assert!(matches!(err, CouponError::MinOrderNotMet { .. }));
        assert!(err.to_string().contains("minimum order"));
    }

    #[test]
    fn min_items_not_met() {
        let discounts = vec![Discount::percentage("Bundle", 10.0, DiscountScope::Cart)
            .with_code("BUNDLE")
            .with_min_items(3)];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 2);

        assert_eq!(
            validator.validate("BUNDLE", &cart, None, 0),
            Err(CouponError::MinItemsNotMet {
                required: 3,
                count: 2
            })
        );
    }

    #[test]
    fn window_errors_are_distinct() {
        let discounts = vec![
            save15().with_window(Some(100), Some(200)),
        ];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 1);

        assert!(matches!(
            validator.validate("SAVE15", &cart, None, 50),
            Err(CouponError::NotYetActive(_))
        ));
        assert!(matches!(
            validator.validate("SAVE15", &cart, None, 300),
            Err(CouponError::Expired(_))
        ));
    }

    #[test]
    fn global_usage_limit() {
        let mut discount = save15().with_usage_limit(10);
        discount.used_count = 10;
        let discounts = vec![discount];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 1);

        assert!(matches!(
            validator.validate("SAVE15", &cart, None, 0),
            Err(CouponError::UsageLimitReached(_))
        ));
    }

    #[test]
    fn per_customer_limit() {
        let discount = save15().with_per_customer_limit(1);
        let id = discount.id.clone();
        let discounts = vec![discount];
        let validator = CouponValidator::new(&discounts);
        let cart = cart_with(10000, 1);

        let mut usage = CustomerUsage::default();
        usage.record(id);

        assert!(matches!(
            validator.validate("SAVE15", &cart, Some(&usage), 0),
            Err(CouponError::UsageLimitReached(_))
        ));
    }

    #[test]
    fn reapplying_active_code_is_rejected() {
        let discounts = vec![save15()];
        let validator = CouponValidator::new(&discounts);
        let mut cart = cart_with(10000, 1);
        cart.apply_coupon("save15");

        assert_eq!(
            validator.validate("Save15", &cart, None, 0),
            Err(CouponError::AlreadyApplied("SAVE15".into()))
        );
    }
}
