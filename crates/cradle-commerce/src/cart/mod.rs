//! Shopping cart module.
//!
//! Cart session, line items, and the persistence adapter.

mod cart;
mod line;
mod store;

pub use cart::Cart;
pub use line::{CartLine, MAX_QUANTITY_PER_LINE};
pub use store::{CartStore, JsonCartStore};
