//! Promotional discount definitions.
//!
//! A [`Discount`] is read-only from the storefront's point of view: rules are
//! fetched from the backend, evaluated locally for display, and never mutated
//! here. The derived [`DiscountStatus`] captures the lifecycle (window,
//! usage caps, kill switch) in one place so the evaluator and the coupon
//! validator agree on what "active" means.

use crate::cart::CartLine;
use crate::ids::{CategoryId, DiscountId, ProductId, VariantId};
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// What a discount's amount is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountScope {
    /// The whole order subtotal.
    Cart,
    /// The matching line items only.
    Item,
}

/// What the "get" units of a BOGO rule pay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum BogoReward {
    /// Percent off the unit price (100 = free).
    PercentOff(f64),
    /// Fixed amount off each unit, capped at the unit price.
    AmountOff(Money),
}

/// The magnitude of a discount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DiscountValue {
    /// Percent off the base, optionally capped.
    Percentage {
        percent: f64,
        max_discount: Option<Money>,
    },
    /// Fixed amount off, never exceeding the base.
    Fixed(Money),
    /// For every `buy` units of a matching line, `get` further units earn
    /// the reward. Only complete `buy + get` groups count.
    BuyXGetY {
        buy: i64,
        get: i64,
        reward: BogoReward,
    },
}

impl DiscountValue {
    /// Short display label, e.g. "10% off" or "$5.00 off".
    pub fn badge(&self) -> String {
        match self {
            DiscountValue::Percentage { percent, .. } => {
                if percent.fract() == 0.0 {
                    format!("{percent:.0}% off")
                } else {
                    format!("{percent}% off")
                }
            }
            DiscountValue::Fixed(amount) => format!("{} off", amount.display()),
            DiscountValue::BuyXGetY { buy, get, .. } => format!("Buy {buy} get {get}"),
        }
    }
}

/// Which products a discount is restricted to. All lists empty means the
/// rule applies to every line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscountTargets {
    pub products: Vec<ProductId>,
    pub variants: Vec<VariantId>,
    pub categories: Vec<CategoryId>,
}

impl DiscountTargets {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.variants.is_empty() && self.categories.is_empty()
    }

    /// Whether a cart line falls under this targeting. Empty targeting
    /// matches everything.
    pub fn matches(&self, line: &CartLine) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.products.contains(&line.product_id) {
            return true;
        }
        if let Some(variant) = &line.variant_id {
            if self.variants.contains(variant) {
                return true;
            }
        }
        if let Some(category) = &line.category_id {
            if self.categories.contains(category) {
                return true;
            }
        }
        false
    }
}

/// Derived lifecycle state of a discount at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountStatus {
    Active,
    Inactive,
    Scheduled,
    Expired,
}

/// A promotional rule as published by the backend. Wire format is
/// camelCase, like every other backend payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Unique discount identifier.
    pub id: DiscountId,
    /// Display name.
    pub name: String,
    /// Longer description.
    pub description: Option<String>,
    /// Magnitude of the discount.
    pub value: DiscountValue,
    /// Whether the amount is computed on the cart or on matching lines.
    pub scope: DiscountScope,
    /// Coupon code; `None` means the rule auto-applies to eligible carts.
    /// Always stored uppercase.
    pub code: Option<String>,
    /// Product/variant/category restrictions.
    pub targets: DiscountTargets,
    /// Whether this rule may combine with others on the same base.
    pub is_stackable: bool,
    /// Kill switch.
    pub active: bool,
    /// Window start (unix seconds).
    pub starts_at: Option<i64>,
    /// Window end (unix seconds).
    pub ends_at: Option<i64>,
    /// Global redemption cap.
    pub usage_limit: Option<i64>,
    /// Redemptions so far.
    pub used_count: i64,
    /// Per-customer redemption cap.
    pub per_customer_limit: Option<i64>,
    /// Minimum cart subtotal to qualify.
    pub min_order_amount: Option<Money>,
    /// Minimum total item quantity to qualify.
    pub min_items: Option<i64>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of last update.
    pub updated_at: i64,
}

impl Discount {
    fn base(name: impl Into<String>, value: DiscountValue, scope: DiscountScope) -> Self {
        let now = current_timestamp();
        Self {
            id: DiscountId::generate(),
            name: name.into(),
            description: None,
            value,
            scope,
            code: None,
            targets: DiscountTargets::default(),
            is_stackable: false,
            active: true,
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            used_count: 0,
            per_customer_limit: None,
            min_order_amount: None,
            min_items: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// New percentage discount.
    pub fn percentage(name: impl Into<String>, percent: f64, scope: DiscountScope) -> Self {
        Self::base(
            name,
            DiscountValue::Percentage {
                percent,
                max_discount: None,
            },
            scope,
        )
    }

    /// New fixed-amount discount.
    pub fn fixed(name: impl Into<String>, amount: Money, scope: DiscountScope) -> Self {
        Self::base(name, DiscountValue::Fixed(amount), scope)
    }

    /// New buy-X-get-Y discount. BOGO only makes sense per line, so the
    /// scope is always `Item`.
    pub fn bogo(name: impl Into<String>, buy: i64, get: i64, reward: BogoReward) -> Self {
        Self::base(name, DiscountValue::BuyXGetY { buy, get, reward }, DiscountScope::Item)
    }

    /// Attach a coupon code, normalized to uppercase.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into().trim().to_uppercase());
        self
    }

    /// Restrict to specific products.
    pub fn with_target_products(mut self, products: Vec<ProductId>) -> Self {
        self.targets.products = products;
        self
    }

    /// Restrict to specific categories.
    pub fn with_target_categories(mut self, categories: Vec<CategoryId>) -> Self {
        self.targets.categories = categories;
        self
    }

    /// Cap a percentage discount's computed amount.
    pub fn with_max_discount(mut self, cap: Money) -> Self {
        if let DiscountValue::Percentage { max_discount, .. } = &mut self.value {
            *max_discount = Some(cap);
        }
        self
    }

    /// Require a minimum cart subtotal.
    pub fn with_min_order(mut self, amount: Money) -> Self {
        self.min_order_amount = Some(amount);
        self
    }

    /// Require a minimum item count.
    pub fn with_min_items(mut self, count: i64) -> Self {
        self.min_items = Some(count);
        self
    }

    /// Cap global redemptions.
    pub fn with_usage_limit(mut self, limit: i64) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    /// Cap per-customer redemptions.
    pub fn with_per_customer_limit(mut self, limit: i64) -> Self {
        self.per_customer_limit = Some(limit);
        self
    }

    /// Allow combining with other discounts.
    pub fn stackable(mut self) -> Self {
        self.is_stackable = true;
        self
    }

    /// Set the activity window.
    pub fn with_window(mut self, starts_at: Option<i64>, ends_at: Option<i64>) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    /// Whether this rule requires a coupon code to activate.
    pub fn is_coupon(&self) -> bool {
        self.code.is_some()
    }

    /// Whether the global usage cap is spent.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .map(|limit| self.used_count >= limit)
            .unwrap_or(false)
    }

    /// Derived lifecycle status at `now` (unix seconds).
    pub fn status(&self, now: i64) -> DiscountStatus {
        if !self.active || self.is_exhausted() {
            return DiscountStatus::Inactive;
        }
        if let Some(starts) = self.starts_at {
            if now < starts {
                return DiscountStatus::Scheduled;
            }
        }
        if let Some(ends) = self.ends_at {
            if now > ends {
                return DiscountStatus::Expired;
            }
        }
        DiscountStatus::Active
    }

    /// Shorthand for `status(now) == Active`.
    pub fn is_active(&self, now: i64) -> bool {
        self.status(now) == DiscountStatus::Active
    }
}

/// One applied discount in an evaluation result: the rule's identity plus
/// the amount it contributed to the current cart. Ephemeral, recomputed on
/// every evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPreview {
    /// The discount rule this amount came from.
    pub discount_id: DiscountId,
    /// Display name.
    pub name: String,
    /// Coupon code, if the rule required one.
    pub code: Option<String>,
    /// Scope of the rule.
    pub scope: DiscountScope,
    /// Display badge, e.g. "10% off".
    pub badge: String,
    /// Targeting snapshot, for per-line attribution.
    pub targets: DiscountTargets,
    /// Whether the rule was stackable.
    pub is_stackable: bool,
    /// Total amount this rule contributed for the current cart.
    pub amount: Money,
}

impl DiscountPreview {
    /// Snapshot a discount with its computed contribution.
    pub fn from_discount(discount: &Discount, amount: Money) -> Self {
        Self {
            discount_id: discount.id.clone(),
            name: discount.name.clone(),
            code: discount.code.clone(),
            scope: discount.scope,
            badge: discount.value.badge(),
            targets: discount.targets.clone(),
            is_stackable: discount.is_stackable,
            amount,
        }
    }
}

/// Current unix timestamp in seconds.
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
