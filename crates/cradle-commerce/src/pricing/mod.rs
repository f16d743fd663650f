//! The pricing engine: evaluation, per-line attribution, and final totals.

mod attribute;
mod evaluate;
mod totals;

pub use attribute::{attribute, LinePricing};
pub use evaluate::{evaluate, Evaluation};
pub use totals::{compute_totals, CartTotals, PricingConfig, TaxBase};
