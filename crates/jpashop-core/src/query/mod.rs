//! Order graph loading.
//!
//! Strategies are written against the [`QueryEngine`] trait and compose three
//! building blocks: the [`CriteriaBuilder`] for filters, the
//! [`BatchedFanOutLoader`] for to-many relations, and the assemblers in
//! [`grouping`] for joined result sets.

mod budget;
mod criteria;
mod engine;
mod fanout;
pub mod grouping;
mod service;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use budget::{CollectionPaging, LoadBudget};
pub use criteria::{CriteriaBuilder, OrderPredicate, MAX_RESULTS};
pub use engine::{ChildRow, JoinedRow, OrderLine, OrderRoot, QueryEngine};
pub use fanout::BatchedFanOutLoader;
pub use grouping::{dedup_joined, FlatRowAssembler};
pub use service::OrderQueryService;
pub use strategy::{FetchStrategy, OrderLoader};
