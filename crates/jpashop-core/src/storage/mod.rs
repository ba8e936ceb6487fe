//! Storage layer for jpashop.
//!
//! This module provides a sled-based order store. Reads go through a
//! request-scoped [`Session`] that implements the query engine interface the
//! loading strategies consume.

mod codec;
mod config;
mod engine;
mod session;

pub mod key;

pub use codec::StoredRow;
pub use config::StorageConfig;
pub use engine::ShopStore;
pub use session::Session;
