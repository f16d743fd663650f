//! Cart line items.

use crate::error::CommerceError;
use crate::ids::{CategoryId, LineItemId, ProductId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line.
pub const MAX_QUANTITY_PER_LINE: i64 = 9999;

/// One entry in a shopping cart.
///
/// The variant is optional because plenty of products sell without variants;
/// the category rides along so category-scoped discounts can match without a
/// catalog lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    /// Unique line identifier.
    pub id: LineItemId,
    /// Product being purchased.
    pub product_id: ProductId,
    /// Variant, when the product has them.
    pub variant_id: Option<VariantId>,
    /// Category, for category-scoped discounts.
    pub category_id: Option<CategoryId>,
    /// Product name (denormalized for display).
    pub product_name: String,
    /// Quantity, always >= 1.
    pub quantity: i64,
    /// Price per unit.
    pub unit_price: Money,
}

impl CartLine {
    /// Create a line, validating quantity and price.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Result<Self, CommerceError> {
        if quantity <= 0 {
            return Err(CommerceError::InvalidQuantity(quantity));
        }
        if quantity > MAX_QUANTITY_PER_LINE {
            return Err(CommerceError::QuantityExceedsLimit(
                quantity,
                MAX_QUANTITY_PER_LINE,
            ));
        }
        if unit_price.is_negative() {
            return Err(CommerceError::InvalidUnitPrice(unit_price.cents));
        }
        Ok(Self {
            id: LineItemId::generate(),
            product_id,
            variant_id: None,
            category_id: None,
            product_name: product_name.into(),
            quantity,
            unit_price,
        })
    }

    /// Attach a variant.
    pub fn with_variant(mut self, variant_id: VariantId) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    /// Attach a category.
    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Line total (unit price × quantity), checked.
    pub fn total(&self) -> Result<Money, CommerceError> {
        self.unit_price
            .try_multiply(self.quantity)
            .ok_or(CommerceError::Overflow)
    }

    /// Whether this line carries data the pricing engine can work with.
    /// Lines that fail this gate contribute nothing to an evaluation but do
    /// not abort it.
    pub fn is_priced(&self) -> bool {
        !self.product_id.as_str().is_empty() && self.quantity > 0 && self.unit_price.is_positive()
    }

    /// Key used when two lines count as "the same item": the variant when
    /// present, the product otherwise. Mirrors the backend's line shape.
    pub fn merge_key(&self) -> &str {
        self.variant_id
            .as_ref()
            .map(VariantId::as_str)
            .unwrap_or_else(|| self.product_id.as_str())
    }
}
