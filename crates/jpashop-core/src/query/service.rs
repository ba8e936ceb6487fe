//! Store-facing entry point for order queries.

use jpashop_proto::{OrderQueryDto, OrderSearch, OrderSimpleQueryDto, Pagination};

use crate::error::Error;
use crate::storage::ShopStore;

use super::budget::LoadBudget;
use super::strategy::{FetchStrategy, OrderLoader};

/// Runs order queries against a [`ShopStore`].
///
/// Each call opens its own session, so the identity map and the query count
/// never outlive one request.
pub struct OrderQueryService<'s> {
    store: &'s ShopStore,
    budget: LoadBudget,
}

impl<'s> OrderQueryService<'s> {
    pub fn new(store: &'s ShopStore, budget: LoadBudget) -> Self {
        Self { store, budget }
    }

    pub fn budget(&self) -> &LoadBudget {
        &self.budget
    }

    /// Orders with their line items, loaded with `strategy`.
    pub fn orders(
        &self,
        strategy: FetchStrategy,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderQueryDto>, Error> {
        self.orders_counted(strategy, search, pagination)
            .map(|(orders, _)| orders)
    }

    /// Like [`orders`](Self::orders), also returning the queries this call
    /// issued through its own session.
    pub fn orders_counted(
        &self,
        strategy: FetchStrategy,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<(Vec<OrderQueryDto>, u64), Error> {
        let session = self.store.session();
        let orders = OrderLoader::new(&session, &self.budget).orders(strategy, search, pagination)?;
        Ok((orders, session.queries_issued()))
    }

    /// Orders with buyer name and delivery address only.
    pub fn simple_orders(
        &self,
        strategy: FetchStrategy,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderSimpleQueryDto>, Error> {
        self.simple_orders_counted(strategy, search, pagination)
            .map(|(orders, _)| orders)
    }

    /// Like [`simple_orders`](Self::simple_orders), also returning the
    /// queries this call issued.
    pub fn simple_orders_counted(
        &self,
        strategy: FetchStrategy,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<(Vec<OrderSimpleQueryDto>, u64), Error> {
        let session = self.store.session();
        let orders =
            OrderLoader::new(&session, &self.budget).simple_orders(strategy, search, pagination)?;
        Ok((orders, session.queries_issued()))
    }
}
