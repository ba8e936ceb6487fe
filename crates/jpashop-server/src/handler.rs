//! Endpoint dispatch.

use jpashop_core::{FetchStrategy, LoadBudget, OrderQueryService};
use jpashop_proto::{OrderSearch, Pagination};
use serde_json::Value;
use tracing::{debug, warn};

use crate::database::SharedDatabase;
use crate::error::Error;

/// A named order query endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Simple view, lazy to-one relations.
    SimpleV2,
    /// Simple view, to-one join.
    SimpleV3,
    /// Full graph, lazy relations.
    OrdersV2,
    /// Full graph, single full join.
    OrdersV3,
    /// Full graph, to-one join plus fan-out, always paged.
    OrdersV31,
    /// Full graph, one child query per order.
    OrdersV4,
    /// Full graph, to-one join plus fan-out.
    OrdersV5,
    /// Full graph, flat projection grouped in memory.
    OrdersV6,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::SimpleV2,
        Endpoint::SimpleV3,
        Endpoint::OrdersV2,
        Endpoint::OrdersV3,
        Endpoint::OrdersV31,
        Endpoint::OrdersV4,
        Endpoint::OrdersV5,
        Endpoint::OrdersV6,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::SimpleV2 => "simple-v2",
            Endpoint::SimpleV3 => "simple-v3",
            Endpoint::OrdersV2 => "orders-v2",
            Endpoint::OrdersV3 => "orders-v3",
            Endpoint::OrdersV31 => "orders-v3.1",
            Endpoint::OrdersV4 => "orders-v4",
            Endpoint::OrdersV5 => "orders-v5",
            Endpoint::OrdersV6 => "orders-v6",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|endpoint| endpoint.name() == s)
    }

    /// Strategy serving this endpoint.
    pub fn strategy(&self) -> FetchStrategy {
        match self {
            Endpoint::SimpleV2 | Endpoint::OrdersV2 => FetchStrategy::Naive,
            Endpoint::SimpleV3 | Endpoint::OrdersV31 | Endpoint::OrdersV5 => {
                FetchStrategy::ToOneJoin
            }
            Endpoint::OrdersV3 => FetchStrategy::FullJoin,
            Endpoint::OrdersV4 => FetchStrategy::PerRoot,
            Endpoint::OrdersV6 => FetchStrategy::Flat,
        }
    }

    /// Whether the endpoint returns the to-one only view.
    pub fn is_simple(&self) -> bool {
        matches!(self, Endpoint::SimpleV2 | Endpoint::SimpleV3)
    }

    /// The window used for a request: the paged endpoint falls back to the
    /// default page.
    pub fn window(&self, requested: Option<Pagination>) -> Option<Pagination> {
        match (self, requested) {
            (Endpoint::OrdersV31, None) => Some(Pagination::default()),
            (_, requested) => requested,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Handles endpoint requests against the shared database.
pub struct RequestHandler {
    database: SharedDatabase,
    budget: LoadBudget,
}

impl RequestHandler {
    /// Create a new request handler.
    pub fn new(database: SharedDatabase, budget: LoadBudget) -> Self {
        Self { database, budget }
    }

    /// Serve one request and return its JSON body.
    pub fn handle(
        &self,
        endpoint: Endpoint,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<Value, Error> {
        let service = OrderQueryService::new(self.database.store(), self.budget.clone());
        let strategy = endpoint.strategy();
        let window = endpoint.window(pagination);

        let (body, queries) = if endpoint.is_simple() {
            let (orders, queries) = service.simple_orders_counted(strategy, search, window)?;
            (serde_json::to_value(orders)?, queries)
        } else {
            let (orders, queries) = service.orders_counted(strategy, search, window)?;
            (serde_json::to_value(orders)?, queries)
        };

        debug!(endpoint = endpoint.name(), queries, "request served");
        Ok(body)
    }

    /// Serve one request, mapping failures to an error body.
    pub fn handle_or_error(
        &self,
        endpoint: Endpoint,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Value {
        match self.handle(endpoint, search, pagination) {
            Ok(body) => body,
            Err(e) => {
                warn!(endpoint = endpoint.name(), error = %e, "request failed");
                serde_json::json!({ "error": e.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::database::Database;
    use std::sync::Arc;

    fn handler(budget: LoadBudget) -> RequestHandler {
        let database = Database::open(&ServerConfig::default().temporary()).unwrap();
        RequestHandler::new(Arc::new(database), budget)
    }

    #[test]
    fn test_endpoint_names() {
        for endpoint in Endpoint::ALL {
            assert_eq!(Endpoint::parse(endpoint.name()), Some(endpoint));
        }
        assert_eq!(Endpoint::parse("simple-v4"), None);
    }

    #[test]
    fn test_only_v31_pages_by_default() {
        assert_eq!(Endpoint::OrdersV31.window(None), Some(Pagination::default()));
        assert_eq!(Endpoint::OrdersV5.window(None), None);
        assert_eq!(
            Endpoint::OrdersV31.window(Some(Pagination::new(1, 1))),
            Some(Pagination::new(1, 1))
        );
    }

    #[test]
    fn test_orders_body_shape() {
        let handler = handler(LoadBudget::default());
        let body = handler
            .handle(Endpoint::OrdersV5, &OrderSearch::all(), None)
            .unwrap();

        let orders = body.as_array().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0]["name"], "userA");
        assert_eq!(orders[0]["orderStatus"], "ORDER");
        assert_eq!(orders[0]["address"]["city"], "Seoul");
        assert_eq!(orders[0]["orderItems"][1]["itemName"], "JPA2 BOOK");
        assert_eq!(orders[0]["orderItems"][1]["orderPrice"], 20000);
        assert_eq!(orders[0]["orderItems"][1]["count"], 2);
    }

    #[test]
    fn test_all_full_endpoints_agree() {
        let handler = handler(LoadBudget::default());
        let expected = handler
            .handle(Endpoint::OrdersV2, &OrderSearch::all(), None)
            .unwrap();

        for endpoint in Endpoint::ALL.into_iter().filter(|e| !e.is_simple()) {
            let body = handler.handle(endpoint, &OrderSearch::all(), None).unwrap();
            assert_eq!(body, expected, "{endpoint}");
        }
    }

    #[test]
    fn test_simple_body_has_no_items() {
        let handler = handler(LoadBudget::default());
        let body = handler
            .handle(Endpoint::SimpleV3, &OrderSearch::all(), None)
            .unwrap();

        assert_eq!(body[1]["name"], "userB");
        assert!(body[1].get("orderItems").is_none());
    }

    #[test]
    fn test_paged_full_join_is_an_error_body() {
        let handler = handler(LoadBudget::default());
        let body = handler.handle_or_error(
            Endpoint::OrdersV3,
            &OrderSearch::all(),
            Some(Pagination::new(100, 1)),
        );

        assert!(body["error"].as_str().unwrap().contains("full-join"));
    }
}
