//! Load budget: limits and policies shared by all strategies.

use super::criteria::MAX_RESULTS;

/// How strategies that join a collection treat an offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionPaging {
    /// Reject the request with [`Error::InvalidPagination`](crate::Error::InvalidPagination).
    #[default]
    Reject,
    /// Materialize the capped result set, deduplicate roots, then apply the
    /// window to roots in memory.
    InMemory,
}

/// Budget limits for order loading.
#[derive(Debug, Clone)]
pub struct LoadBudget {
    /// Maximum root orders any single query may return.
    pub max_results: usize,
    /// Maximum order ids per batched child query.
    pub max_batch_size: usize,
    /// Pagination policy for collection-joining strategies.
    pub collection_paging: CollectionPaging,
}

impl Default for LoadBudget {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            max_batch_size: MAX_RESULTS,
            collection_paging: CollectionPaging::Reject,
        }
    }
}

impl LoadBudget {
    /// Create a budget with custom limits.
    pub fn new(max_results: usize, max_batch_size: usize, collection_paging: CollectionPaging) -> Self {
        Self {
            max_results,
            max_batch_size: max_batch_size.max(1),
            collection_paging,
        }
    }

    /// Set the batch size of the fan-out loader.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    /// Set the result cap.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set the collection pagination policy.
    pub fn with_collection_paging(mut self, paging: CollectionPaging) -> Self {
        self.collection_paging = paging;
        self
    }
}
