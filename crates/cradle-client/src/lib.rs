//! Backend API client and preview plumbing for the Cradle storefront.
//!
//! The domain math lives in `cradle-commerce`; this crate supplies the I/O
//! around it:
//!
//! - [`StorefrontApi`]: typed HTTP client for the discount endpoints
//!   (`GET /discounts/active`, `POST /discounts/validate/{code}`,
//!   `POST /discounts/calculate`).
//! - [`Previewer`] / [`PreviewSequencer`]: fetch-then-evaluate driver with
//!   generation-based last-write-wins, so a stale in-flight response can
//!   never overwrite a newer one.
//! - [`PreviewState`]: the observable loading / ready / failed state the UI
//!   renders, keeping "fetch failed" distinct from "no discounts apply".

mod api;
mod error;
mod preview;

pub use api::{
    AppliedDiscountDto, CartItemDto, CouponOutcome, DiscountSource, ServerCalculation,
    StorefrontApi,
};
pub use error::ApiError;
pub use preview::{PreviewSequencer, PreviewState, PreviewTicket, Previewer};
