//! Seaport 1.6 order model.
//!
//! [`types`] mirrors the JSON shape the order-book service stores orders in,
//! [`order`] builds listing/offer components and [`eip712`] produces what
//! gets signed.

pub mod eip712;
pub mod order;
mod types;

pub use order::{ApprovalRequirement, OrderBuildError, OrderTerms};
pub use types::*;
