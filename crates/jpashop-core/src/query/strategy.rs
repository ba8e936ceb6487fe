//! Fetch strategies for the order graph.
//!
//! | strategy    | root query joins            | children             | DB paging |
//! |-------------|-----------------------------|----------------------|-----------|
//! | `Naive`     | member (filter only)        | lazy, one per entity | yes       |
//! | `PerRoot`   | member, delivery            | one query per order  | yes       |
//! | `ToOneJoin` | member, delivery            | batched fan-out      | yes       |
//! | `FullJoin`  | member, delivery, items     | in the same query    | no        |
//! | `Flat`      | member, delivery, items     | in the same query    | no        |
//!
//! A strategy may push an offset/limit window to the store only when none of
//! its joins multiplies root rows. For the others the window is rejected or
//! applied in memory, depending on [`CollectionPaging`].

use std::collections::HashMap;

use jpashop_proto::{OrderItemQueryDto, OrderQueryDto, OrderSearch, OrderSimpleQueryDto, Pagination};
use tracing::{debug, info, instrument};

use crate::error::Error;
use crate::model::{Delivery, Item, Member, Order, Relation};

use super::budget::{CollectionPaging, LoadBudget};
use super::criteria::{CriteriaBuilder, OrderPredicate};
use super::engine::{OrderRoot, QueryEngine};
use super::fanout::{root_dto, simple_dto, BatchedFanOutLoader};
use super::grouping::{dedup_joined, FlatRowAssembler};

const TO_ONE: &[Relation] = &[Relation::OrderMember, Relation::OrderDelivery];
const FULL_GRAPH: &[Relation] = &[
    Relation::OrderMember,
    Relation::OrderDelivery,
    Relation::OrderItems,
    Relation::OrderItemItem,
];

/// How the order graph is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStrategy {
    /// Roots only; every relation resolved on first use.
    Naive,
    /// To-one join, then one child query per order.
    PerRoot,
    /// To-one join, then one batched child query per page.
    ToOneJoin,
    /// Single query joining the whole graph, deduplicated by order identity.
    FullJoin,
    /// Single flat projection query, grouped in memory.
    Flat,
}

impl FetchStrategy {
    /// Every strategy, baseline first.
    pub const ALL: [FetchStrategy; 5] = [
        FetchStrategy::Naive,
        FetchStrategy::PerRoot,
        FetchStrategy::ToOneJoin,
        FetchStrategy::FullJoin,
        FetchStrategy::Flat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FetchStrategy::Naive => "naive",
            FetchStrategy::PerRoot => "per-root",
            FetchStrategy::ToOneJoin => "to-one-join",
            FetchStrategy::FullJoin => "full-join",
            FetchStrategy::Flat => "flat",
        }
    }

    /// Parse a strategy name as returned by [`FetchStrategy::name`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|strategy| strategy.name() == s)
    }

    /// Relations joined into the root query.
    pub fn joined_relations(&self) -> &'static [Relation] {
        match self {
            FetchStrategy::Naive => &[Relation::OrderMember],
            FetchStrategy::PerRoot | FetchStrategy::ToOneJoin => TO_ONE,
            FetchStrategy::FullJoin | FetchStrategy::Flat => FULL_GRAPH,
        }
    }

    /// Names of the joined relations, comma separated.
    pub fn join_summary(&self) -> String {
        self.joined_relations()
            .iter()
            .map(Relation::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether an offset/limit window can be pushed to the store.
    pub fn supports_db_pagination(&self) -> bool {
        !self.joined_relations().iter().any(Relation::multiplies_rows)
    }
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Loads order graphs from a query engine.
pub struct OrderLoader<'e, E: QueryEngine> {
    engine: &'e E,
    budget: &'e LoadBudget,
    criteria: CriteriaBuilder,
}

impl<'e, E: QueryEngine> OrderLoader<'e, E> {
    /// Create a loader over an engine with the given budget.
    pub fn new(engine: &'e E, budget: &'e LoadBudget) -> Self {
        Self {
            engine,
            budget,
            criteria: CriteriaBuilder::new(budget.max_results),
        }
    }

    /// Load orders with their line items.
    #[instrument(skip(self, strategy), fields(strategy = %strategy))]
    pub fn orders(
        &self,
        strategy: FetchStrategy,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderQueryDto>, Error> {
        let predicate = self.criteria.build(search);
        debug!(joins = %strategy.join_summary(), "root query shape");

        let orders = match strategy {
            FetchStrategy::Naive => self.naive(&predicate, pagination)?,
            FetchStrategy::PerRoot => self.per_root(&predicate, pagination)?,
            FetchStrategy::ToOneJoin => self.to_one_join(&predicate, pagination)?,
            FetchStrategy::FullJoin => {
                let window = self.collection_window(strategy, pagination)?;
                let orders = dedup_joined(self.engine.load_full_joined(&predicate)?);
                apply_window(orders, window)
            }
            FetchStrategy::Flat => {
                let window = self.collection_window(strategy, pagination)?;
                let rows = self.engine.load_flat_joined(&predicate)?;
                debug!(rows = rows.len(), "flat rows loaded");
                apply_window(FlatRowAssembler::assemble(&rows), window)
            }
        };

        info!(orders = orders.len(), "orders loaded");
        Ok(orders)
    }

    /// Load orders with their to-one relations only.
    #[instrument(skip(self, strategy), fields(strategy = %strategy))]
    pub fn simple_orders(
        &self,
        strategy: FetchStrategy,
        search: &OrderSearch,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderSimpleQueryDto>, Error> {
        let predicate = self.criteria.build(search);

        let orders = match strategy {
            FetchStrategy::Naive => {
                let mut context = IdentityMap::new(self.engine);
                self.engine
                    .scan_orders(&predicate, pagination)?
                    .into_iter()
                    .map(|order| context.root(order).map(simple_dto))
                    .collect::<Result<Vec<_>, Error>>()?
            }
            FetchStrategy::PerRoot | FetchStrategy::ToOneJoin => self
                .engine
                .load_roots(&predicate, pagination)?
                .into_iter()
                .map(simple_dto)
                .collect(),
            FetchStrategy::FullJoin | FetchStrategy::Flat => {
                return Err(Error::InvalidData(format!(
                    "the {strategy} strategy loads line items and has no simple view"
                )));
            }
        };

        info!(orders = orders.len(), "simple orders loaded");
        Ok(orders)
    }

    fn naive(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderQueryDto>, Error> {
        let orders = self.engine.scan_orders(predicate, pagination)?;
        let mut context = IdentityMap::new(self.engine);

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let order_id = order.id;
            let dto = root_dto(context.root(order)?);

            let mut items = Vec::new();
            for order_item in self.engine.find_order_items(order_id)? {
                let item = context.item(order_item.item_id)?;
                items.push(OrderItemQueryDto::new(item.name, order_item.order_price, order_item.count));
            }
            result.push(dto.with_items(items));
        }

        Ok(result)
    }

    fn per_root(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderQueryDto>, Error> {
        let roots = self.engine.load_roots(predicate, pagination)?;

        let mut result = Vec::with_capacity(roots.len());
        for root in roots {
            let items = self
                .engine
                .load_batch_children(&[root.order.id])?
                .into_iter()
                .map(|row| {
                    OrderItemQueryDto::new(row.line.item.name, row.line.order_item.order_price, row.line.order_item.count)
                })
                .collect();
            result.push(root_dto(root).with_items(items));
        }

        Ok(result)
    }

    fn to_one_join(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderQueryDto>, Error> {
        let roots = self.engine.load_roots(predicate, pagination)?;
        debug!(roots = roots.len(), "root page loaded");
        BatchedFanOutLoader::new(self.engine, self.budget.max_batch_size).load(roots)
    }

    /// Decide how a window is honoured by a collection-joining strategy.
    fn collection_window(
        &self,
        strategy: FetchStrategy,
        pagination: Option<Pagination>,
    ) -> Result<Option<Pagination>, Error> {
        match (pagination, self.budget.collection_paging) {
            (None, _) => Ok(None),
            (Some(page), CollectionPaging::Reject) => Err(Error::InvalidPagination {
                strategy: strategy.name(),
                offset: page.offset,
                limit: page.limit,
            }),
            (Some(page), CollectionPaging::InMemory) => {
                // The materialized set ends at the cap
                let reach = page.offset as usize + page.limit as usize;
                if reach > self.budget.max_results {
                    return Err(Error::InvalidPagination {
                        strategy: strategy.name(),
                        offset: page.offset,
                        limit: page.limit,
                    });
                }
                Ok(Some(page))
            }
        }
    }
}

fn apply_window(orders: Vec<OrderQueryDto>, window: Option<Pagination>) -> Vec<OrderQueryDto> {
    match window {
        Some(page) => page.apply(orders),
        None => orders,
    }
}

/// Request-scoped identity map for lazily resolved relations.
///
/// Each related entity is fetched at most once per map; later accesses are
/// served from memory.
struct IdentityMap<'e, E: QueryEngine> {
    engine: &'e E,
    members: HashMap<u64, Member>,
    deliveries: HashMap<u64, Delivery>,
    items: HashMap<u64, Item>,
}

impl<'e, E: QueryEngine> IdentityMap<'e, E> {
    fn new(engine: &'e E) -> Self {
        Self {
            engine,
            members: HashMap::new(),
            deliveries: HashMap::new(),
            items: HashMap::new(),
        }
    }

    fn root(&mut self, order: Order) -> Result<OrderRoot, Error> {
        let member = self.member(order.member_id)?;
        let delivery = self.delivery(order.delivery_id)?;
        Ok(OrderRoot {
            order,
            member,
            delivery,
        })
    }

    fn member(&mut self, id: u64) -> Result<Member, Error> {
        if let Some(member) = self.members.get(&id) {
            return Ok(member.clone());
        }
        let member = self
            .engine
            .find_member(id)?
            .ok_or_else(|| Error::InvalidData(format!("missing member {id}")))?;
        self.members.insert(id, member.clone());
        Ok(member)
    }

    fn delivery(&mut self, id: u64) -> Result<Delivery, Error> {
        if let Some(delivery) = self.deliveries.get(&id) {
            return Ok(delivery.clone());
        }
        let delivery = self
            .engine
            .find_delivery(id)?
            .ok_or_else(|| Error::InvalidData(format!("missing delivery {id}")))?;
        self.deliveries.insert(id, delivery.clone());
        Ok(delivery)
    }

    fn item(&mut self, id: u64) -> Result<Item, Error> {
        if let Some(item) = self.items.get(&id) {
            return Ok(item.clone());
        }
        let item = self
            .engine
            .find_item(id)?
            .ok_or_else(|| Error::InvalidData(format!("missing item {id}")))?;
        self.items.insert(id, item.clone());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::RecordingEngine;
    use jpashop_proto::OrderStatus;

    fn loader<'e>(engine: &'e RecordingEngine, budget: &'e LoadBudget) -> OrderLoader<'e, RecordingEngine> {
        OrderLoader::new(engine, budget)
    }

    #[test]
    fn test_pagination_support() {
        assert!(FetchStrategy::Naive.supports_db_pagination());
        assert!(FetchStrategy::PerRoot.supports_db_pagination());
        assert!(FetchStrategy::ToOneJoin.supports_db_pagination());
        assert!(!FetchStrategy::FullJoin.supports_db_pagination());
        assert!(!FetchStrategy::Flat.supports_db_pagination());
    }

    #[test]
    fn test_join_summary() {
        assert_eq!(FetchStrategy::Naive.join_summary(), "order.member");
        assert_eq!(FetchStrategy::ToOneJoin.join_summary(), "order.member, order.delivery");
        assert_eq!(
            FetchStrategy::Flat.join_summary(),
            "order.member, order.delivery, order.order_items, order_item.item"
        );
    }

    #[test]
    fn test_parse_names() {
        for strategy in FetchStrategy::ALL {
            assert_eq!(FetchStrategy::parse(strategy.name()), Some(strategy));
        }
        assert_eq!(FetchStrategy::parse("eager"), None);
    }

    #[test]
    fn test_strategies_agree() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();
        let loader = loader(&engine, &budget);

        let expected = loader
            .orders(FetchStrategy::Naive, &OrderSearch::all(), None)
            .unwrap();
        assert_eq!(expected.len(), 3);

        for strategy in FetchStrategy::ALL {
            let result = loader.orders(strategy, &OrderSearch::all(), None).unwrap();
            assert_eq!(result, expected, "{strategy} disagrees with naive");
        }
    }

    #[test]
    fn test_to_one_join_issues_two_queries() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();

        loader(&engine, &budget)
            .orders(FetchStrategy::ToOneJoin, &OrderSearch::all(), Some(Pagination::limit(10)))
            .unwrap();

        assert_eq!(engine.calls(), vec!["load_roots", "load_batch_children"]);
    }

    #[test]
    fn test_naive_issues_one_query_per_entity() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();

        loader(&engine, &budget)
            .orders(FetchStrategy::Naive, &OrderSearch::all(), None)
            .unwrap();

        let calls = engine.calls();
        let count = |name: &str| calls.iter().filter(|c| **c == name).count();
        assert_eq!(count("scan_orders"), 1);
        assert_eq!(count("find_member"), 3);
        assert_eq!(count("find_delivery"), 3);
        assert_eq!(count("find_order_items"), 3);
        assert_eq!(count("find_item"), 3);
    }

    #[test]
    fn test_per_root_issues_one_child_query_per_order() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();

        loader(&engine, &budget)
            .orders(FetchStrategy::PerRoot, &OrderSearch::all(), None)
            .unwrap();

        assert_eq!(engine.calls().len(), 1 + 3);
    }

    #[test]
    fn test_root_pagination_keeps_items_together() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();
        let loader = loader(&engine, &budget);

        let first = loader
            .orders(FetchStrategy::ToOneJoin, &OrderSearch::all(), Some(Pagination::new(1, 0)))
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].order_items.len(), 2);

        let second = loader
            .orders(FetchStrategy::ToOneJoin, &OrderSearch::all(), Some(Pagination::new(1, 1)))
            .unwrap();
        assert_eq!(second[0].order_id, 2);
    }

    #[test]
    fn test_full_join_rejects_pagination() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();

        let err = loader(&engine, &budget)
            .orders(FetchStrategy::FullJoin, &OrderSearch::all(), Some(Pagination::new(5, 1)))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidPagination {
                strategy: "full-join",
                offset: 1,
                limit: 5
            }
        ));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_flat_rejects_pagination() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();

        let err = loader(&engine, &budget)
            .orders(FetchStrategy::Flat, &OrderSearch::all(), Some(Pagination::limit(5)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPagination { strategy: "flat", .. }));
    }

    #[test]
    fn test_in_memory_paging_pages_roots() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default().with_collection_paging(CollectionPaging::InMemory);
        let loader = loader(&engine, &budget);

        for strategy in [FetchStrategy::FullJoin, FetchStrategy::Flat] {
            let page = loader
                .orders(strategy, &OrderSearch::all(), Some(Pagination::new(1, 0)))
                .unwrap();
            assert_eq!(page.len(), 1);
            assert_eq!(page[0].order_id, 1);
            assert_eq!(page[0].order_items.len(), 2, "{strategy} split an order");
        }
    }

    #[test]
    fn test_in_memory_window_past_cap_is_rejected() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default()
            .with_max_results(2)
            .with_collection_paging(CollectionPaging::InMemory);
        let loader = loader(&engine, &budget);

        for strategy in [FetchStrategy::FullJoin, FetchStrategy::Flat] {
            let err = loader
                .orders(strategy, &OrderSearch::all(), Some(Pagination::new(2, 1)))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidPagination { offset: 1, limit: 2, .. }));
        }
        assert!(engine.calls().is_empty());

        let inside = loader
            .orders(FetchStrategy::FullJoin, &OrderSearch::all(), Some(Pagination::new(1, 1)))
            .unwrap();
        assert_eq!(inside[0].order_id, 2);
    }

    #[test]
    fn test_db_window_stops_at_cap() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default().with_max_results(2);
        let loader = loader(&engine, &budget);

        let page = loader
            .orders(FetchStrategy::ToOneJoin, &OrderSearch::all(), Some(Pagination::new(2, 1)))
            .unwrap();
        let ids: Vec<u64> = page.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_filters_apply_to_every_strategy() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();
        let loader = loader(&engine, &budget);
        let search = OrderSearch::all().with_status(OrderStatus::Cancel);

        for strategy in FetchStrategy::ALL {
            let result = loader.orders(strategy, &search, None).unwrap();
            assert_eq!(result.len(), 1, "{strategy}");
            assert_eq!(result[0].order_id, 3);
        }
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();
        let loader = loader(&engine, &budget);
        let search = OrderSearch::all().with_member_name("kim");

        for strategy in FetchStrategy::ALL {
            assert!(loader.orders(strategy, &search, None).unwrap().is_empty());
        }
    }

    #[test]
    fn test_simple_orders() {
        let engine = RecordingEngine::sample();
        let budget = LoadBudget::default();
        let loader = loader(&engine, &budget);

        let naive = loader
            .simple_orders(FetchStrategy::Naive, &OrderSearch::all(), None)
            .unwrap();
        let joined = loader
            .simple_orders(FetchStrategy::ToOneJoin, &OrderSearch::all(), None)
            .unwrap();

        assert_eq!(naive, joined);
        assert_eq!(naive[1].name, "userB");
        assert!(loader
            .simple_orders(FetchStrategy::Flat, &OrderSearch::all(), None)
            .is_err());
    }

    #[test]
    fn test_engine_failure_is_not_retried() {
        let engine = RecordingEngine::sample().failing_on("load_roots");
        let budget = LoadBudget::default();

        let result = loader(&engine, &budget).orders(FetchStrategy::ToOneJoin, &OrderSearch::all(), None);

        assert!(matches!(result, Err(Error::InvalidData(_))));
        assert_eq!(engine.calls(), vec!["load_roots"]);
    }
}
