//! Cart, discount, and pricing domain logic for the Cradle storefront.
//!
//! This crate is the single home of the storefront's discount math. Every
//! surface that shows a price — cart page, checkout, sidebar, coupon widget
//! — goes through the same three calls:
//!
//! - [`pricing::evaluate`] turns a cart plus the active discount catalog
//!   into a [`pricing::Evaluation`] (applied rules, total discount, pre-tax
//!   amount).
//! - [`pricing::attribute`] distributes that result back onto individual
//!   lines for display.
//! - [`pricing::compute_totals`] folds in VAT and produces the amount that
//!   is actually charged.
//!
//! # Example
//!
//! ```
//! use cradle_commerce::prelude::*;
//!
//! let mut cart = Cart::default();
//! cart.add_line(CartLine::new(
//!     ProductId::new("prod-1"),
//!     "Convertible Car Seat",
//!     2,
//!     Money::new(10000, Currency::USD),
//! )?)?;
//!
//! let discounts = vec![Discount::percentage("Spring Sale", 10.0, DiscountScope::Cart)];
//! let eval = evaluate(&cart, &discounts, 0)?;
//! assert_eq!(eval.total_discount.cents, 2000);
//!
//! let totals = compute_totals(eval.subtotal, eval.total_discount, &PricingConfig::default())?;
//! assert_eq!(totals.grand_total.cents, 19000);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod discount;
pub mod pricing;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    pub use crate::cart::{Cart, CartLine, CartStore, JsonCartStore};

    pub use crate::discount::{
        BogoReward, CouponError, CouponValidator, CustomerUsage, Discount, DiscountPreview,
        DiscountScope, DiscountStatus, DiscountTargets, DiscountValue,
    };

    pub use crate::pricing::{
        attribute, compute_totals, evaluate, CartTotals, Evaluation, LinePricing, PricingConfig,
        TaxBase,
    };
}
