//! Cart persistence adapter.
//!
//! The cart survives across sessions; discounts and previews never do, they
//! are re-derived from the live catalog on every evaluation. Storage is a
//! boundary concern: the pricing engine only ever sees a [`Cart`] value.

use crate::cart::Cart;
use crate::error::CommerceError;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a cart is durably kept between visits.
pub trait CartStore {
    /// Load the persisted cart, if one exists.
    fn load(&self) -> Result<Option<Cart>, CommerceError>;
    /// Persist the cart.
    fn save(&self, cart: &Cart) -> Result<(), CommerceError>;
    /// Forget the persisted cart.
    fn clear(&self) -> Result<(), CommerceError>;
}

/// JSON-file-backed store, the native stand-in for browser local storage.
#[derive(Debug, Clone)]
pub struct JsonCartStore {
    path: PathBuf,
}

impl JsonCartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStore for JsonCartStore {
    fn load(&self) -> Result<Option<Cart>, CommerceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        let cart = serde_json::from_slice(&bytes)?;
        Ok(Some(cart))
    }

    fn save(&self, cart: &Cart) -> Result<(), CommerceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(cart)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CommerceError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartLine;
    use crate::ids::ProductId;
    use crate::money::{Currency, Money};

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCartStore::new(dir.path().join("cart.json"));

        let mut cart = Cart::default();
        cart.add_line(
            CartLine::new(
                ProductId::new("prod-1"),
                "Baby Monitor",
                2,
                Money::new(7999, Currency::USD),
            )
            .unwrap(),
        )
        .unwrap();
        cart.apply_coupon("WELCOME5");

        store.save(&cart).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, cart);
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCartStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCartStore::new(dir.path().join("cart.json"));
        store.save(&Cart::default()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }
}
