//! Per-line discount attribution.
//!
//! Turns an [`Evaluation`] into the line-by-line view the cart UI renders:
//! original total, savings, discounted total, and a badge naming the rule
//! that best explains the saving. The attributor distributes the already-
//! computed preview amounts instead of recomputing formulas, so the lines
//! reconcile to the cart total cent for cent.

use crate::cart::{Cart, CartLine};
use crate::discount::DiscountScope;
use crate::error::CommerceError;
use crate::ids::LineItemId;
use crate::money::Money;
use crate::pricing::Evaluation;
use serde::{Deserialize, Serialize};

/// Display pricing for one cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinePricing {
    /// The line this breakdown belongs to.
    pub line_id: LineItemId,
    /// Unit price × quantity before discounts.
    pub original_total: Money,
    /// Savings attributed to this line.
    pub discount: Money,
    /// `original_total - discount`.
    pub discounted_total: Money,
    /// Badge of the first rule that touched this line, e.g. "10% off".
    pub badge: Option<String>,
}

impl LinePricing {
    pub fn has_discount(&self) -> bool {
        self.discount.is_positive()
    }

    /// Effective per-unit price after savings.
    pub fn effective_unit_price(&self, quantity: i64) -> Money {
        if quantity <= 0 {
            return self.discounted_total;
        }
        Money::new(self.discounted_total.cents / quantity, self.discounted_total.currency)
    }
}

/// Distribute the evaluation's applied amounts across the cart's lines.
///
/// Each preview's amount is split over the lines it matched, proportionally
/// to line totals, with largest-remainder cent allocation. Item-scope
/// previews land on their targeted lines; cart-scope previews spread over
/// every priced line. Unpriced lines come back with zero savings.
pub fn attribute(cart: &Cart, evaluation: &Evaluation) -> Result<Vec<LinePricing>, CommerceError> {
    let priced: Vec<(usize, &CartLine)> = cart
        .lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_priced())
        .collect();

    let mut totals = vec![Money::zero(cart.currency); cart.lines.len()];
    let mut discounts = vec![Money::zero(cart.currency); cart.lines.len()];
    let mut badges: Vec<Option<String>> = vec![None; cart.lines.len()];

    for (index, line) in &priced {
        totals[*index] = line.total()?;
    }

    for preview in &evaluation.applied {
        let matched: Vec<usize> = priced
            .iter()
            .filter(|(_, line)| match preview.scope {
                DiscountScope::Cart => true,
                DiscountScope::Item => preview.targets.matches(line),
            })
            .map(|(index, _)| *index)
            .collect();
        if matched.is_empty() {
            continue;
        }

        let weights: Vec<i64> = matched.iter().map(|&i| totals[i].cents).collect();
        let shares = preview.amount.allocate(&weights);
        for (&index, share) in matched.iter().zip(shares) {
            discounts[index] = discounts[index]
                .try_add(&share)
                .ok_or(CommerceError::Overflow)?;
            if badges[index].is_none() {
                badges[index] = Some(preview.badge.clone());
            }
        }
    }

    let mut lines = Vec::with_capacity(cart.lines.len());
    for (index, line) in cart.lines.iter().enumerate() {
        // A line never saves more than it costs, whatever overlapped on it.
        let discount = discounts[index].min(&totals[index]).clamp_non_negative();
        let discounted_total = totals[index]
            .try_subtract(&discount)
            .ok_or(CommerceError::Overflow)?;
        lines.push(LinePricing {
            line_id: line.id.clone(),
            original_total: totals[index],
            discount,
            discounted_total,
            badge: if discount.is_positive() {
                badges[index].take()
            } else {
                None
            },
        });
    }
    Ok(lines)
}
