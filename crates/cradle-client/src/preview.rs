//! Preview state and request sequencing.
//!
//! Quantity changes can outrun in-flight catalog fetches, so every refresh
//! takes a generation ticket and only the newest generation may install its
//! result. A stale response arriving late is discarded, whatever its
//! arrival order. While a refresh is in flight the state is `Loading`,
//! which the UI must keep distinct from "zero discounts apply".

use crate::api::DiscountSource;
use crate::error::ApiError;
use cradle_commerce::cart::Cart;
use cradle_commerce::discount::current_timestamp;
use cradle_commerce::pricing::{evaluate, Evaluation};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Observable state of the discount preview.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewState {
    /// No evaluation requested yet.
    Idle,
    /// A refresh is in flight; do not show stale or zero figures.
    Loading,
    /// The latest evaluation.
    Ready(Evaluation),
    /// The latest refresh failed; message is for the shopper.
    Failed(String),
}

impl PreviewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PreviewState::Loading)
    }

    /// The evaluation, when one is ready.
    pub fn evaluation(&self) -> Option<&Evaluation> {
        match self {
            PreviewState::Ready(eval) => Some(eval),
            _ => None,
        }
    }
}

/// Ticket for one refresh request. Only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewTicket(u64);

/// Last-write-wins holder for the preview state, keyed by request
/// generation rather than response arrival order.
#[derive(Debug, Default)]
pub struct PreviewSequencer {
    latest: AtomicU64,
    state: Mutex<Option<PreviewState>>,
}

impl PreviewSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new refresh: bumps the generation and marks `Loading`.
    /// Any earlier in-flight request is superseded from this moment.
    pub fn begin(&self) -> PreviewTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.set(PreviewState::Loading);
        PreviewTicket(generation)
    }

    /// Publish a result for `ticket`. Returns whether it was installed;
    /// stale tickets are dropped.
    pub fn accept(&self, ticket: PreviewTicket, outcome: Result<Evaluation, ApiError>) -> bool {
        if ticket.0 != self.latest.load(Ordering::SeqCst) {
            debug!(generation = ticket.0, "discarding stale preview response");
            return false;
        }
        self.set(match outcome {
            Ok(eval) => PreviewState::Ready(eval),
            Err(e) => PreviewState::Failed(e.to_string()),
        });
        true
    }

    /// Current state.
    pub fn state(&self) -> PreviewState {
        self.lock().clone().unwrap_or(PreviewState::Idle)
    }

    fn set(&self, state: PreviewState) {
        *self.lock() = Some(state);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<PreviewState>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drives the preview: fetches the catalog, runs the local evaluator, and
/// publishes through the sequencer.
pub struct Previewer<S: DiscountSource> {
    source: S,
    sequencer: PreviewSequencer,
}

impl<S: DiscountSource> Previewer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            sequencer: PreviewSequencer::new(),
        }
    }

    /// Re-evaluate the cart. An empty cart resolves locally to the zero
    /// result with no network call.
    pub async fn refresh(&self, cart: &Cart) -> PreviewState {
        let ticket = self.sequencer.begin();

        if cart.is_empty() {
            self.sequencer
                .accept(ticket, Ok(Evaluation::empty(cart.currency)));
            return self.sequencer.state();
        }

        let outcome = match self.source.fetch_active().await {
            Ok(discounts) => {
                evaluate(cart, &discounts, current_timestamp()).map_err(ApiError::from)
            }
            Err(e) => Err(e),
        };
        self.sequencer.accept(ticket, outcome);
        self.sequencer.state()
    }

    /// Current preview state without triggering a refresh.
    pub fn state(&self) -> PreviewState {
        self.sequencer.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cradle_commerce::cart::CartLine;
    use cradle_commerce::discount::{Discount, DiscountScope};
    use cradle_commerce::ids::ProductId;
    use cradle_commerce::money::{Currency, Money};
    use std::sync::atomic::AtomicUsize;

    struct InMemorySource {
        discounts: Vec<Discount>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl InMemorySource {
        fn new(discounts: Vec<Discount>) -> Self {
            Self {
                discounts,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            let mut source = Self::new(Vec::new());
            source.fail = true;
            source
        }
    }

    #[async_trait]
    impl DiscountSource for InMemorySource {
        async fn fetch_active(&self) -> Result<Vec<Discount>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Request("connection refused".into()));
            }
            Ok(self.discounts.clone())
        }
    }

    fn cart_with_line() -> Cart {
        let mut cart = Cart::default();
        cart.add_line(
            CartLine::new(
                ProductId::new("prod-1"),
                "High Chair",
                2,
                Money::new(10000, Currency::USD),
            )
            .unwrap(),
        )
        .unwrap();
        cart
    }

    #[tokio::test]
    async fn refresh_produces_a_ready_evaluation() {
        let previewer = Previewer::new(InMemorySource::new(vec![Discount::percentage(
            "Sale",
            10.0,
            DiscountScope::Cart,
        )]));

        let state = previewer.refresh(&cart_with_line()).await;
        let eval = state.evaluation().expect("ready");
        assert_eq!(eval.total_discount.cents, 2000);
    }

    #[tokio::test]
    async fn empty_cart_skips_the_network() {
        let previewer = Previewer::new(InMemorySource::new(Vec::new()));

        let state = previewer.refresh(&Cart::default()).await;
        let eval = state.evaluation().expect("ready");
        assert!(eval.total_discount.is_zero());
        assert_eq!(previewer.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_is_a_distinct_state() {
        let previewer = Previewer::new(InMemorySource::failing());

        let state = previewer.refresh(&cart_with_line()).await;
        assert!(matches!(state, PreviewState::Failed(_)));
        // a failure is never rendered as "zero discounts"
        assert!(state.evaluation().is_none());
    }

    #[test]
    fn stale_responses_are_discarded() {
        let sequencer = PreviewSequencer::new();
        let first = sequencer.begin();
        let second = sequencer.begin();

        // The newer request resolves first.
        assert!(sequencer.accept(second, Ok(Evaluation::empty(Currency::USD))));
        // The older one arrives late and is dropped.
        assert!(!sequencer.accept(first, Err(ApiError::Request("slow".into()))));
        assert!(matches!(sequencer.state(), PreviewState::Ready(_)));
    }

    #[test]
    fn begin_marks_loading() {
        let sequencer = PreviewSequencer::new();
        assert_eq!(sequencer.state(), PreviewState::Idle);
        let _ticket = sequencer.begin();
        assert!(sequencer.state().is_loading());
    }
}
