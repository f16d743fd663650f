//! Storefront backend API.
//!
//! Thin typed wrapper over the discount endpoints. The backend's numbers at
//! order creation are authoritative; whatever the local evaluator showed,
//! the charged amount comes from here.

use crate::error::ApiError;
use async_trait::async_trait;
use cradle_commerce::cart::{Cart, CartLine};
use cradle_commerce::discount::Discount;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Anything that can supply the active discount catalog. The HTTP client
/// implements this; tests use an in-memory source.
#[async_trait]
pub trait DiscountSource: Send + Sync {
    /// Fetch discounts currently in their window and under their caps.
    async fn fetch_active(&self) -> Result<Vec<Discount>, ApiError>;
}

/// One cart line in the backend's wire shape. The line key is the variant
/// id when the product has variants, the product id otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItemDto {
    /// Line key: variant id preferred over product id.
    pub id: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub quantity: i64,
    /// Major units, e.g. 49.99.
    pub unit_price: f64,
}

impl CartItemDto {
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            id: line.merge_key().to_string(),
            product_id: line.product_id.to_string(),
            variant_id: line.variant_id.as_ref().map(ToString::to_string),
            category_id: line.category_id.as_ref().map(ToString::to_string),
            quantity: line.quantity,
            unit_price: line.unit_price.to_decimal(),
        }
    }

    fn from_cart(cart: &Cart) -> Vec<Self> {
        cart.lines
            .iter()
            .filter(|l| l.is_priced())
            .map(Self::from_line)
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest {
    cart_items: Vec<CartItemDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateRequest {
    cart_items: Vec<CartItemDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discount_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_id: Option<String>,
}

/// Backend's answer to a coupon validation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CouponOutcome {
    pub valid: bool,
    pub message: String,
    pub discount: Option<Discount>,
}

/// One applied discount as the backend reports it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedDiscountDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    /// Major units.
    pub amount: f64,
}

/// Backend's authoritative calculation for a cart.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerCalculation {
    pub total_discount: f64,
    pub applied_discounts: Vec<AppliedDiscountDto>,
    pub final_amount: f64,
}

/// HTTP client for the storefront backend.
#[derive(Debug, Clone)]
pub struct StorefrontApi {
    http: reqwest::Client,
    base_url: String,
}

impl StorefrontApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use a preconfigured reqwest client (timeouts, proxies).
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "backend returned error status");
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    /// `POST /discounts/validate/{code}`: server-side coupon validation.
    pub async fn validate_coupon(
        &self,
        code: &str,
        cart: &Cart,
        customer_id: Option<&str>,
    ) -> Result<CouponOutcome, ApiError> {
        let code = code.trim().to_uppercase();
        debug!(%code, "validating coupon with backend");
        let body = ValidateRequest {
            cart_items: CartItemDto::from_cart(cart),
            customer_id: customer_id.map(str::to_string),
        };
        let response = self
            .http
            .post(self.url(&format!("/discounts/validate/{code}")))
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /discounts/calculate`: the backend's own evaluation, used to
    /// reconcile the advisory local result.
    pub async fn calculate(
        &self,
        cart: &Cart,
        customer_id: Option<&str>,
    ) -> Result<ServerCalculation, ApiError> {
        debug!(lines = cart.line_count(), "requesting backend calculation");
        let body = CalculateRequest {
            cart_items: CartItemDto::from_cart(cart),
            discount_code: cart.coupon_code.clone(),
            customer_id: customer_id.map(str::to_string),
        };
        let response = self
            .http
            .post(self.url("/discounts/calculate"))
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl DiscountSource for StorefrontApi {
    /// `GET /discounts/active`.
    async fn fetch_active(&self) -> Result<Vec<Discount>, ApiError> {
        debug!("fetching active discounts");
        let response = self.http.get(self.url("/discounts/active")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cradle_commerce::ids::{ProductId, VariantId};
    use cradle_commerce::money::{Currency, Money};

    #[test]
    fn cart_item_dto_is_keyed_by_variant_when_present() {
        let line = CartLine::new(
            ProductId::new("prod-1"),
            "Night Light",
            2,
            Money::new(1999, Currency::USD),
        )
        .unwrap()
        .with_variant(VariantId::new("var-7"));

        let dto = CartItemDto::from_line(&line);
        assert_eq!(dto.id, "var-7");
        assert_eq!(dto.product_id, "prod-1");
        assert_eq!(dto.unit_price, 19.99);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let line = CartLine::new(
            ProductId::new("prod-1"),
            "Night Light",
            1,
            Money::new(500, Currency::USD),
        )
        .unwrap();
        let json = serde_json::to_value(CartItemDto::from_line(&line)).unwrap();

        assert!(json.get("productId").is_some());
        assert!(json.get("unitPrice").is_some());
        // absent optionals are omitted, not null
        assert!(json.get("variantId").is_none());
    }

    #[test]
    fn unpriced_lines_stay_off_the_wire() {
        let mut cart = Cart::default();
        cart.add_line(
            CartLine::new(
                ProductId::new("prod-1"),
                "Mobile",
                1,
                Money::new(1000, Currency::USD),
            )
            .unwrap(),
        )
        .unwrap();
        cart.add_line(
            CartLine::new(
                ProductId::new("free"),
                "Sample",
                1,
                Money::new(0, Currency::USD),
            )
            .unwrap(),
        )
        .unwrap();

        assert_eq!(CartItemDto::from_cart(&cart).len(), 1);
    }

    #[test]
    fn coupon_outcome_parses() {
        let json = r#"{
            "valid": false,
            "message": "Minimum order of $50.00 not met",
            "discount": null
        }"#;
        let outcome: CouponOutcome = serde_json::from_str(json).unwrap();
        assert!(!outcome.valid);
        assert!(outcome.discount.is_none());
    }

    #[test]
    fn coupon_outcome_discount_is_camel_case() {
        // The nested discount uses the same camelCase wire format as the
        // rest of the payload.
        let json = r#"{
            "valid": true,
            "message": "Coupon applied",
            "discount": {
                "id": "disc-1",
                "name": "Welcome",
                "description": null,
                "value": {"fixed": {"cents": 1500, "currency": "USD"}},
                "scope": "cart",
                "code": "WELCOME15",
                "targets": {"products": [], "variants": [], "categories": []},
                "isStackable": false,
                "active": true,
                "startsAt": null,
                "endsAt": null,
                "usageLimit": 100,
                "usedCount": 3,
                "perCustomerLimit": 1,
                "minOrderAmount": {"cents": 5000, "currency": "USD"},
                "minItems": null,
                "createdAt": 1700000000,
                "updatedAt": 1700000000
            }
        }"#;
        let outcome: CouponOutcome = serde_json::from_str(json).unwrap();
        assert!(outcome.valid);
        let discount = outcome.discount.unwrap();
        assert_eq!(discount.code.as_deref(), Some("WELCOME15"));
        assert_eq!(discount.min_order_amount.unwrap().cents, 5000);
        assert!(!discount.is_stackable);
    }

    #[test]
    fn server_calculation_parses() {
        let json = r#"{
            "totalDiscount": 20.0,
            "appliedDiscounts": [
                {"id": "disc-1", "name": "Spring Sale", "amount": 20.0}
            ],
            "finalAmount": 180.0
        }"#;
        let calc: ServerCalculation = serde_json::from_str(json).unwrap();
        assert_eq!(calc.total_discount, 20.0);
        assert_eq!(calc.applied_discounts.len(), 1);
        assert!(calc.applied_discounts[0].code.is_none());
    }
}
