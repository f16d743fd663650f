//! Discount catalog types and coupon validation.

mod discount;
mod validate;

pub use discount::{
    BogoReward, Discount, DiscountPreview, DiscountScope, DiscountStatus, DiscountTargets,
    DiscountValue,
};
pub use validate::{CouponError, CouponValidator, CustomerUsage};

pub use discount::current_timestamp;
