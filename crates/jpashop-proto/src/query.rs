//! Search criteria and pagination.

use serde::{Deserialize, Serialize};

use crate::value::OrderStatus;

/// Page size used when a caller asks for a page without choosing a limit.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Order search criteria.
///
/// Both filters are optional; an absent filter places no constraint on its
/// field. Criteria are built per request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSearch {
    /// Exact order status to match.
    pub status: Option<OrderStatus>,
    /// Case-sensitive substring of the buyer's name.
    pub member_name: Option<String>,
}

impl OrderSearch {
    /// Criteria matching every order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to orders with the given status.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to orders whose buyer name contains `name`.
    pub fn with_member_name(mut self, name: impl Into<String>) -> Self {
        self.member_name = Some(name.into());
        self
    }
}

/// Offset/limit window over root entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of results to return.
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}

impl Pagination {
    /// Create pagination with limit and offset.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Create pagination with just a limit.
    pub fn limit(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    /// Apply this window to an in-memory sequence.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::limit(DEFAULT_PAGE_LIMIT)
    }
}
