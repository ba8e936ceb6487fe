//! jpashop protocol types.
//!
//! This crate defines the values, search criteria and projections shared by
//! the order query engine and the service in front of it.
//!
//! # Modules
//!
//! - [`value`] - Embedded value types stored with entities (status, address)
//! - [`query`] - Search criteria and pagination windows
//! - [`result`] - Output projections (nested, flat and simple order views)
//!
//! Value types derive `rkyv` traits so the storage layer can persist them
//! directly; projections derive `serde` only, since shaping them for a wire
//! format is left to the caller.

pub mod query;
pub mod result;
pub mod value;

pub use query::{OrderSearch, Pagination, DEFAULT_PAGE_LIMIT};
pub use result::{OrderFlatDto, OrderItemQueryDto, OrderQueryDto, OrderSimpleQueryDto};
pub use value::{Address, DeliveryStatus, OrderStatus};
