//! jpashop core - entity model, order store and graph-loading strategies.
//!
//! This crate loads orders together with their buyer, delivery and line items
//! without issuing one query per row and without breaking root-level
//! pagination when a one-to-many join multiplies rows.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod error;
pub mod model;
pub mod query;
pub mod storage;

pub use error::Error;
pub use model::{Cardinality, Delivery, Item, Member, NewOrderLine, Order, OrderItem, Relation};
pub use query::{
    BatchedFanOutLoader, CollectionPaging, CriteriaBuilder, FetchStrategy, FlatRowAssembler,
    LoadBudget, OrderLoader, OrderPredicate, OrderQueryService, QueryEngine,
};
pub use storage::{Session, ShopStore, StorageConfig};

/// Re-export protocol types.
pub use jpashop_proto as proto;
