//! Request-scoped read session.

use std::cell::Cell;
use std::time::Instant;

use jpashop_proto::{OrderFlatDto, Pagination};
use tracing::debug;

use super::codec::StoredRow;
use super::engine::{get, ShopStore};
use super::key::{decode_id, encode_id, ID_SIZE};
use crate::error::Error;
use crate::model::{Delivery, Item, Member, Order, OrderItem};
use crate::query::{ChildRow, JoinedRow, OrderLine, OrderPredicate, OrderRoot, QueryEngine};

/// A read session over the store, scoped to one request.
///
/// Every [`QueryEngine`] call counts as one query. The count is kept per
/// session and added to the store-wide total; it is logged when the session
/// is dropped, whether the request succeeded or not.
pub struct Session<'a> {
    store: &'a ShopStore,
    queries: Cell<u64>,
    opened_at: Instant,
}

impl<'a> Session<'a> {
    pub(crate) fn new(store: &'a ShopStore) -> Self {
        Self {
            store,
            queries: Cell::new(0),
            opened_at: Instant::now(),
        }
    }

    /// Queries issued through this session so far.
    pub fn queries_issued(&self) -> u64 {
        self.queries.get()
    }

    fn begin(&self, query: &'static str) {
        self.queries.set(self.queries.get() + 1);
        self.store.record_query();
        debug!(query, seq = self.queries.get(), "query");
    }

    /// Orders matching `predicate` with their buyers, windowed and capped.
    fn matching_orders(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<(Order, Member)>, Error> {
        let (skip, take) = predicate.window(pagination);

        let mut matched = Vec::new();
        let mut skipped = 0;
        for value in self.store.orders.iter().values() {
            if matched.len() >= take {
                break;
            }
            let order = Order::from_bytes(&value?)?;
            let member = self.required_member(order.member_id)?;
            if !predicate.matches(&order, &member) {
                continue;
            }
            if skipped < skip {
                skipped += 1;
                continue;
            }
            matched.push((order, member));
        }

        Ok(matched)
    }

    fn roots(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderRoot>, Error> {
        self.matching_orders(predicate, pagination)?
            .into_iter()
            .map(|(order, member)| {
                let delivery = get::<Delivery>(&self.store.deliveries, order.delivery_id)?
                    .ok_or_else(|| Error::InvalidData(format!("order {} has no delivery", order.id)))?;
                Ok(OrderRoot {
                    order,
                    member,
                    delivery,
                })
            })
            .collect()
    }

    fn required_member(&self, id: u64) -> Result<Member, Error> {
        get::<Member>(&self.store.members, id)?
            .ok_or_else(|| Error::InvalidData(format!("missing member {id}")))
    }

    fn order_items(&self, order_id: u64) -> Result<Vec<OrderItem>, Error> {
        let mut rows = Vec::new();
        for key in self.store.order_item_index.scan_prefix(encode_id(order_id)).keys() {
            let key = key?;
            let order_item_id = key.get(ID_SIZE..).and_then(decode_id).ok_or(Error::InvalidKey)?;
            let order_item = get::<OrderItem>(&self.store.order_items, order_item_id)?
                .ok_or_else(|| Error::InvalidData(format!("dangling order item {order_item_id}")))?;
            rows.push(order_item);
        }
        Ok(rows)
    }

    /// Line items of one order joined with their items, in creation order.
    pub(crate) fn order_lines(&self, order_id: u64) -> Result<Vec<OrderLine>, Error> {
        self.order_items(order_id)?
            .into_iter()
            .map(|order_item| {
                let item = get::<Item>(&self.store.items, order_item.item_id)?
                    .ok_or_else(|| Error::InvalidData(format!("missing item {}", order_item.item_id)))?;
                Ok(OrderLine { order_item, item })
            })
            .collect()
    }

    fn joined(&self, predicate: &OrderPredicate) -> Result<Vec<JoinedRow>, Error> {
        let mut rows = Vec::new();
        for root in self.roots(predicate, None)? {
            let lines = self.order_lines(root.order.id)?;
            if lines.is_empty() {
                rows.push(JoinedRow { root, line: None });
                continue;
            }
            for line in lines {
                rows.push(JoinedRow {
                    root: root.clone(),
                    line: Some(line),
                });
            }
        }
        Ok(rows)
    }
}

impl QueryEngine for Session<'_> {
    fn scan_orders(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Order>, Error> {
        self.begin("scan_orders");
        Ok(self
            .matching_orders(predicate, pagination)?
            .into_iter()
            .map(|(order, _)| order)
            .collect())
    }

    fn find_member(&self, id: u64) -> Result<Option<Member>, Error> {
        self.begin("find_member");
        get(&self.store.members, id)
    }

    fn find_delivery(&self, id: u64) -> Result<Option<Delivery>, Error> {
        self.begin("find_delivery");
        get(&self.store.deliveries, id)
    }

    fn find_item(&self, id: u64) -> Result<Option<Item>, Error> {
        self.begin("find_item");
        get(&self.store.items, id)
    }

    fn find_order_items(&self, order_id: u64) -> Result<Vec<OrderItem>, Error> {
        self.begin("find_order_items");
        self.order_items(order_id)
    }

    fn load_roots(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderRoot>, Error> {
        self.begin("load_roots");
        self.roots(predicate, pagination)
    }

    fn load_batch_children(&self, order_ids: &[u64]) -> Result<Vec<ChildRow>, Error> {
        self.begin("load_batch_children");
        let mut rows = Vec::new();
        for &order_id in order_ids {
            for line in self.order_lines(order_id)? {
                rows.push(ChildRow { order_id, line });
            }
        }
        Ok(rows)
    }

    fn load_full_joined(&self, predicate: &OrderPredicate) -> Result<Vec<JoinedRow>, Error> {
        self.begin("load_full_joined");
        self.joined(predicate)
    }

    fn load_flat_joined(&self, predicate: &OrderPredicate) -> Result<Vec<OrderFlatDto>, Error> {
        self.begin("load_flat_joined");
        Ok(self
            .joined(predicate)?
            .into_iter()
            .map(|JoinedRow { root, line }| {
                let (item_name, order_price, count) = match line {
                    Some(line) => (
                        Some(line.item.name),
                        Some(line.order_item.order_price),
                        Some(line.order_item.count),
                    ),
                    None => (None, None, None),
                };
                OrderFlatDto {
                    order_id: root.order.id,
                    name: root.member.name,
                    order_date: root.order.order_date,
                    order_status: root.order.status,
                    address: root.delivery.address,
                    item_name,
                    order_price,
                    count,
                }
            })
            .collect())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        debug!(
            queries = self.queries.get(),
            elapsed_us = self.opened_at.elapsed().as_micros() as u64,
            "session closed"
        );
    }
}
