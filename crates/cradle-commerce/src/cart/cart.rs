//! The cart session value object.
//!
//! The cart is an explicit value passed into the pricing engine on every
//! evaluation, not a global store. Persistence lives behind
//! [`crate::cart::CartStore`]; the pricing logic never touches I/O.

use crate::cart::{CartLine, MAX_QUANTITY_PER_LINE};
use crate::discount::current_timestamp;
use crate::error::CommerceError;
use crate::ids::{CartId, CustomerId, LineItemId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// A shopping cart session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    /// Customer, when signed in.
    pub customer_id: Option<CustomerId>,
    /// Lines in the cart.
    pub lines: Vec<CartLine>,
    /// The one active coupon code, uppercase. Applying a new code replaces
    /// this, never stacks on it.
    pub coupon_code: Option<String>,
    /// Cart currency; every line must match.
    pub currency: Currency,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Cart {
    /// Create an empty cart.
    pub fn new(currency: Currency) -> Self {
        let now = current_timestamp();
        Self {
            id: CartId::generate(),
            customer_id: None,
            lines: Vec::new(),
            coupon_code: None,
            currency,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a cart for a signed-in customer.
    pub fn for_customer(customer_id: CustomerId, currency: Currency) -> Self {
        let mut cart = Self::new(currency);
        cart.customer_id = Some(customer_id);
        cart
    }

    /// Add a line, merging quantities when the same item (by variant, else
    /// product) is already present.
    pub fn add_line(&mut self, line: CartLine) -> Result<LineItemId, CommerceError> {
        if line.unit_price.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: line.unit_price.currency.code().to_string(),
            });
        }

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.merge_key() == line.merge_key())
        {
            let merged = existing
                .quantity
                .checked_add(line.quantity)
                .ok_or(CommerceError::Overflow)?;
            if merged > MAX_QUANTITY_PER_LINE {
                return Err(CommerceError::QuantityExceedsLimit(
                    merged,
                    MAX_QUANTITY_PER_LINE,
                ));
            }
            existing.quantity = merged;
            self.updated_at = current_timestamp();
            return Ok(existing.id.clone());
        }

        let id = line.id.clone();
        self.lines.push(line);
        self.updated_at = current_timestamp();
        Ok(id)
    }

    /// Set a line's quantity. A quantity <= 0 removes the line (a zero-
    /// quantity line must never exist). Returns whether a line was touched.
    pub fn update_quantity(
        &mut self,
        line_id: &LineItemId,
        quantity: i64,
    ) -> Result<bool, CommerceError> {
        if quantity <= 0 {
            return Ok(self.remove_line(line_id));
        }
        if quantity > MAX_QUANTITY_PER_LINE {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_LINE,
            ));
        }
        match self.lines.iter_mut().find(|l| &l.id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                self.updated_at = current_timestamp();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_line(&mut self, line_id: &LineItemId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.id != line_id);
        let removed = self.lines.len() < before;
        if removed {
            self.updated_at = current_timestamp();
        }
        removed
    }

    /// Empty the cart, dropping the coupon too.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon_code = None;
        self.updated_at = current_timestamp();
    }

    /// Apply a coupon code, replacing any previous one. Returns the code
    /// that was displaced, if any.
    pub fn apply_coupon(&mut self, code: impl Into<String>) -> Option<String> {
        let previous = self.coupon_code.take();
        self.coupon_code = Some(code.into().trim().to_uppercase());
        self.updated_at = current_timestamp();
        previous
    }

    /// Drop the active coupon. Returns it, if there was one.
    pub fn remove_coupon(&mut self) -> Option<String> {
        let removed = self.coupon_code.take();
        if removed.is_some() {
            self.updated_at = current_timestamp();
        }
        removed
    }

    /// Merge another cart into this one (e.g. anonymous cart on sign-in).
    /// Quantities cap at the per-line limit rather than erroring.
    pub fn merge(&mut self, other: Cart) -> Result<(), CommerceError> {
        for line in other.lines {
            if line.unit_price.currency != self.currency {
                return Err(CommerceError::CurrencyMismatch {
                    expected: self.currency.code().to_string(),
                    got: line.unit_price.currency.code().to_string(),
                });
            }
            if let Some(existing) = self
                .lines
                .iter_mut()
                .find(|l| l.merge_key() == line.merge_key())
            {
                existing.quantity = existing
                    .quantity
                    .saturating_add(line.quantity)
                    .min(MAX_QUANTITY_PER_LINE);
            } else {
                self.lines.push(line);
            }
        }
        self.updated_at = current_timestamp();
        Ok(())
    }

    /// Total quantity across priced lines.
    pub fn item_count(&self) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.is_priced())
            .map(|l| l.quantity)
            .sum()
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by id.
    pub fn get_line(&self, line_id: &LineItemId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.id == line_id)
    }

    /// Subtotal over priced lines. Malformed lines contribute nothing.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        let mut total = Money::zero(self.currency);
        for line in self.lines.iter().filter(|l| l.is_priced()) {
            total = total
                .try_add(&line.total()?)
                .ok_or(CommerceError::Overflow)?;
        }
        Ok(total)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(Currency::USD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ProductId, VariantId};

    fn usd(cents: i64) -> Money {
        Money::new(cents, Currency::USD)
    }

    fn line(product: &str, quantity: i64, cents: i64) -> CartLine {
        CartLine::new(ProductId::new(product), product, quantity, usd(cents)).unwrap()
    }

    #[test]
    fn add_line_merges_same_item() {
        let mut cart = Cart::default();
        cart.add_line(line("prod-1", 1, 1000)).unwrap();
        cart.add_line(line("prod-1", 2, 1000)).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn variants_of_one_product_stay_separate() {
        let mut cart = Cart::default();
        cart.add_line(line("prod-1", 1, 1000).with_variant(VariantId::new("var-a")))
            .unwrap();
        cart.add_line(line("prod-1", 1, 1200).with_variant(VariantId::new("var-b")))
            .unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn update_quantity_zero_removes() {
        let mut cart = Cart::default();
        let id = cart.add_line(line("prod-1", 2, 1000)).unwrap();
        assert!(cart.update_quantity(&id, 0).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn coupon_replaces_not_stacks() {
        let mut cart = Cart::default();
        assert_eq!(cart.apply_coupon("save10"), None);
        assert_eq!(cart.apply_coupon("SAVE15"), Some("SAVE10".to_string()));
        assert_eq!(cart.coupon_code.as_deref(), Some("SAVE15"));
    }

    #[test]
    fn clear_drops_coupon_too() {
        let mut cart = Cart::default();
        cart.add_line(line("prod-1", 1, 1000)).unwrap();
        cart.apply_coupon("SAVE10");
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.coupon_code.is_none());
    }

    #[test]
    fn subtotal_skips_unpriced_lines() {
        let mut cart = Cart::default();
        cart.add_line(line("prod-1", 2, 1000)).unwrap();
        // free sample line: valid to hold, excluded from pricing
        cart.add_line(line("prod-2", 1, 0)).unwrap();

        assert_eq!(cart.subtotal().unwrap().cents, 2000);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn merge_caps_at_quantity_limit() {
        let mut cart = Cart::default();
        cart.add_line(line("prod-1", MAX_QUANTITY_PER_LINE - 1, 1000))
            .unwrap();

        let mut other = Cart::default();
        other.add_line(line("prod-1", 5, 1000)).unwrap();

        cart.merge(other).unwrap();
        assert_eq!(cart.lines[0].quantity, MAX_QUANTITY_PER_LINE);
    }

    #[test]
    fn rejects_mixed_currencies() {
        let mut cart = Cart::default();
        let eur_line = CartLine::new(
            ProductId::new("prod-1"),
            "Mobile",
            1,
            Money::new(1000, Currency::EUR),
        )
        .unwrap();
        assert!(cart.add_line(eur_line).is_err());
    }
}
