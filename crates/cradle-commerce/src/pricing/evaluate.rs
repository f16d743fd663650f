//! Discount evaluation.
//!
//! One pass over the cart produces the whole breakdown: which rules apply,
//! what each contributes, and the pre-tax amount left to pay. Every surface
//! (cart page, checkout, sidebar, coupon widget) calls this same function,
//! so the math can never drift between them. There is no incremental
//! update; any cart or coupon change re-runs the full evaluation.
//!
//! Exclusivity rule: candidates are ranked by computed amount (largest
//! first, ties by discount id), and a candidate is dropped when it or an
//! already-applied rule is non-stackable and the two share a base — cart
//! scope shares with cart scope, item scope shares when the matched line
//! sets intersect. The shopper always keeps the single largest discount in
//! any conflict.

use crate::cart::{Cart, CartLine};
use crate::discount::{BogoReward, Discount, DiscountPreview, DiscountScope, DiscountValue};
use crate::error::CommerceError;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Result of one evaluation pass. Ephemeral; recomputed from scratch on
/// every relevant change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evaluation {
    /// Subtotal over priced lines, before any discount.
    pub subtotal: Money,
    /// Sum of all applied discount amounts, clamped to the subtotal.
    pub total_discount: Money,
    /// Every rule that contributed, with its amount.
    pub applied: Vec<DiscountPreview>,
    /// `max(0, subtotal - total_discount)`, pre-tax.
    pub final_amount: Money,
}

impl Evaluation {
    /// The zero result for an empty (or entirely unpriced) cart.
    pub fn empty(currency: crate::money::Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            subtotal: zero,
            total_discount: zero,
            applied: Vec::new(),
            final_amount: zero,
        }
    }

    pub fn has_discounts(&self) -> bool {
        self.total_discount.is_positive()
    }
}

/// A candidate discount with its computed contribution and the lines it
/// matched, used for conflict resolution before anything is applied.
struct Candidate<'a> {
    discount: &'a Discount,
    amount: Money,
    matched: BTreeSet<usize>,
}

impl Candidate<'_> {
    /// Whether two candidates compute against overlapping bases.
    fn overlaps(&self, other: &Candidate<'_>) -> bool {
        match (self.discount.scope, other.discount.scope) {
            (DiscountScope::Cart, DiscountScope::Cart) => true,
            (DiscountScope::Item, DiscountScope::Item) => {
                self.matched.intersection(&other.matched).next().is_some()
            }
            // Cart-level and item-level rules price different bases.
            _ => false,
        }
    }

    fn conflicts_with(&self, other: &Candidate<'_>) -> bool {
        (!self.discount.is_stackable || !other.discount.is_stackable) && self.overlaps(other)
    }
}

/// Evaluate the cart against a discount catalog at time `now`.
///
/// The active set is every automatic rule plus the rule matching the cart's
/// applied coupon code, if any. Malformed lines are skipped, not errors.
pub fn evaluate(
    cart: &Cart,
    discounts: &[Discount],
    now: i64,
) -> Result<Evaluation, CommerceError> {
    let priced: Vec<&CartLine> = cart.lines.iter().filter(|l| l.is_priced()).collect();
    if priced.is_empty() {
        return Ok(Evaluation::empty(cart.currency));
    }

    let mut line_totals = Vec::with_capacity(priced.len());
    for line in &priced {
        line_totals.push(line.total()?);
    }
    let subtotal =
        Money::try_sum(line_totals.iter(), cart.currency).ok_or(CommerceError::Overflow)?;
    let item_count: i64 = priced.iter().map(|l| l.quantity).sum();

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for discount in discounts {
        if !discount.is_active(now) {
            continue;
        }
        // Coupon rules only join the set when their code is on the cart.
        // Case-insensitive: the backend may publish codes in any casing.
        if let Some(code) = &discount.code {
            let applied = cart
                .coupon_code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(code));
            if !applied {
                continue;
            }
        }
        // Eligibility thresholds are re-checked on every pass, so an
        // automatic rule drops out the moment the cart shrinks below them.
        // A minimum in a foreign currency can never be met; the rule is
        // skipped like a malformed line rather than failing the pass.
        if let Some(min) = discount.min_order_amount {
            if !matches!(
                subtotal.try_cmp(&min),
                Some(Ordering::Greater | Ordering::Equal)
            ) {
                continue;
            }
        }
        if let Some(min) = discount.min_items {
            if item_count < min {
                continue;
            }
        }

        let matched: BTreeSet<usize> = match discount.scope {
            DiscountScope::Cart => (0..priced.len()).collect(),
            DiscountScope::Item => (0..priced.len())
                .filter(|&i| discount.targets.matches(priced[i]))
                .collect(),
        };
        if matched.is_empty() {
            continue;
        }

        let base = match discount.scope {
            DiscountScope::Cart => subtotal,
            DiscountScope::Item => Money::try_sum(
                matched.iter().map(|&i| &line_totals[i]),
                cart.currency,
            )
            .ok_or(CommerceError::Overflow)?,
        };

        let amount = compute_amount(discount, base, &matched, &priced)?;
        if !amount.is_positive() {
            continue;
        }
        candidates.push(Candidate {
            discount,
            amount,
            matched,
        });
    }

    // Largest amount first; id breaks ties so repeat evaluations of the
    // same inputs always agree.
    candidates.sort_by(|a, b| {
        b.amount
            .cents
            .cmp(&a.amount.cents)
            .then_with(|| a.discount.id.cmp(&b.discount.id))
    });

    let mut applied: Vec<Candidate<'_>> = Vec::new();
    for candidate in candidates {
        if applied.iter().all(|a| !a.conflicts_with(&candidate)) {
            applied.push(candidate);
        }
    }

    let raw_total = Money::try_sum(applied.iter().map(|a| &a.amount), cart.currency)
        .ok_or(CommerceError::Overflow)?;
    let total_discount = raw_total.min(&subtotal);
    let final_amount = subtotal
        .try_subtract(&total_discount)
        .ok_or(CommerceError::Overflow)?
        .clamp_non_negative();

    Ok(Evaluation {
        subtotal,
        total_discount,
        applied: applied
            .iter()
            .map(|a| DiscountPreview::from_discount(a.discount, a.amount))
            .collect(),
        final_amount,
    })
}

/// Compute one rule's contribution against its base. The result never
/// exceeds the base and is never negative.
fn compute_amount(
    discount: &Discount,
    base: Money,
    matched: &BTreeSet<usize>,
    lines: &[&CartLine],
) -> Result<Money, CommerceError> {
    let amount = match &discount.value {
        DiscountValue::Percentage {
            percent,
            max_discount,
        } => {
            let mut amount = base.percentage(*percent);
            if let Some(cap) = max_discount {
                amount = amount.min(cap);
            }
            amount
        }
        DiscountValue::Fixed(value) => value.min(&base),
        DiscountValue::BuyXGetY { buy, get, reward } => {
            bogo_amount(*buy, *get, reward, matched, lines)?
        }
    };
    Ok(amount.min(&base).clamp_non_negative())
}

/// BOGO contribution over the matched lines. Only complete `buy + get`
/// groups earn the reward; leftover units pay full price.
fn bogo_amount(
    buy: i64,
    get: i64,
    reward: &BogoReward,
    matched: &BTreeSet<usize>,
    lines: &[&CartLine],
) -> Result<Money, CommerceError> {
    let group = buy + get;
    if buy <= 0 || get <= 0 {
        return Ok(Money::zero(lines[0].unit_price.currency));
    }

    let mut total = Money::zero(lines[0].unit_price.currency);
    for &index in matched {
        let line = lines[index];
        let groups = line.quantity / group;
        if groups == 0 {
            continue;
        }
        let rewarded_units = groups * get;
        let per_unit = match reward {
            BogoReward::PercentOff(percent) => line.unit_price.percentage(*percent),
            BogoReward::AmountOff(amount) => amount.min(&line.unit_price),
        }
        .min(&line.unit_price)
        .clamp_non_negative();
        let line_amount = per_unit
            .try_multiply(rewarded_units)
            .ok_or(CommerceError::Overflow)?;
        total = total.try_add(&line_amount).ok_or(CommerceError::Overflow)?;
    }
    Ok(total)
}
