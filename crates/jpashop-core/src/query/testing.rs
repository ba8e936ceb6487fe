//! In-memory query engine that records every query it serves.

use std::cell::RefCell;

use jpashop_proto::{Address, DeliveryStatus, OrderFlatDto, OrderStatus, Pagination};

use crate::error::Error;
use crate::model::{Delivery, Item, Member, Order, OrderItem};

use super::criteria::OrderPredicate;
use super::engine::{ChildRow, JoinedRow, OrderLine, OrderRoot, QueryEngine};

pub(crate) struct RecordingEngine {
    members: Vec<Member>,
    deliveries: Vec<Delivery>,
    items: Vec<Item>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    calls: RefCell<Vec<&'static str>>,
    fail_on: Option<&'static str>,
}

/// Build a root order with id-derived relations.
pub(crate) fn root(id: u64, name: &str) -> OrderRoot {
    OrderRoot {
        order: Order {
            id,
            member_id: id,
            delivery_id: id,
            order_date: id as i64 * 1000,
            status: OrderStatus::Order,
        },
        member: Member {
            id,
            name: name.to_string(),
        },
        delivery: Delivery {
            id,
            address: Address::new("city", id.to_string(), "0000"),
            status: DeliveryStatus::Ready,
        },
    }
}

impl RecordingEngine {
    /// Orders 1 (A x1, B x2), 2 (C x3) and 3 (cancelled, no items).
    pub(crate) fn sample() -> Self {
        let roots = [root(1, "userA"), root(2, "userB"), root(3, "userC")];
        let mut orders: Vec<Order> = roots.iter().map(|r| r.order.clone()).collect();
        orders[2].status = OrderStatus::Cancel;

        let item = |id: u64, name: &str| Item {
            id,
            name: name.to_string(),
            price: 1,
            stock: 100,
        };
        let line = |id: u64, order_id: u64, item_id: u64, count: u32| OrderItem {
            id,
            order_id,
            item_id,
            order_price: 1,
            count,
        };

        Self {
            members: roots.iter().map(|r| r.member.clone()).collect(),
            deliveries: roots.iter().map(|r| r.delivery.clone()).collect(),
            items: vec![item(1, "A"), item(2, "B"), item(3, "C")],
            orders,
            order_items: vec![line(1, 1, 1, 1), line(2, 1, 2, 2), line(3, 2, 3, 3)],
            calls: RefCell::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Fail every call of the named query.
    pub(crate) fn failing_on(mut self, query: &'static str) -> Self {
        self.fail_on = Some(query);
        self
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub(crate) fn reset(&self) {
        self.calls.borrow_mut().clear();
    }

    pub(crate) fn load_all_roots(&self) -> Vec<OrderRoot> {
        self.load_roots(&OrderPredicate::unconstrained(), None)
            .expect("sample roots")
    }

    fn record(&self, query: &'static str) -> Result<(), Error> {
        self.calls.borrow_mut().push(query);
        if self.fail_on == Some(query) {
            return Err(Error::InvalidData(format!("injected failure in {query}")));
        }
        Ok(())
    }

    fn matching_roots(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Vec<OrderRoot> {
        let (skip, take) = predicate.window(pagination);

        self.orders
            .iter()
            .filter_map(|order| {
                let member = self.members.iter().find(|m| m.id == order.member_id)?;
                let delivery = self.deliveries.iter().find(|d| d.id == order.delivery_id)?;
                predicate.matches(order, member).then(|| OrderRoot {
                    order: order.clone(),
                    member: member.clone(),
                    delivery: delivery.clone(),
                })
            })
            .skip(skip)
            .take(take)
            .collect()
    }

    fn lines_of(&self, order_id: u64) -> Vec<OrderLine> {
        self.order_items
            .iter()
            .filter(|oi| oi.order_id == order_id)
            .filter_map(|oi| {
                let item = self.items.iter().find(|i| i.id == oi.item_id)?;
                Some(OrderLine {
                    order_item: oi.clone(),
                    item: item.clone(),
                })
            })
            .collect()
    }

    fn joined(&self, predicate: &OrderPredicate) -> Vec<JoinedRow> {
        let mut rows = Vec::new();
        for root in self.matching_roots(predicate, None) {
            let lines = self.lines_of(root.order.id);
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
        rows
    }
}

impl QueryEngine for RecordingEngine {
    fn scan_orders(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Order>, Error> {
        self.record("scan_orders")?;
        Ok(self
            .matching_roots(predicate, pagination)
            .into_iter()
            .map(|root| root.order)
            .collect())
    }

    fn find_member(&self, id: u64) -> Result<Option<Member>, Error> {
        self.record("find_member")?;
        Ok(self.members.iter().find(|m| m.id == id).cloned())
    }

    fn find_delivery(&self, id: u64) -> Result<Option<Delivery>, Error> {
        self.record("find_delivery")?;
        Ok(self.deliveries.iter().find(|d| d.id == id).cloned())
    }

    fn find_item(&self, id: u64) -> Result<Option<Item>, Error> {
        self.record("find_item")?;
        Ok(self.items.iter().find(|i| i.id == id).cloned())
    }

    fn find_order_items(&self, order_id: u64) -> Result<Vec<OrderItem>, Error> {
        self.record("find_order_items")?;
        Ok(self
            .order_items
            .iter()
            .filter(|oi| oi.order_id == order_id)
            .cloned()
            .collect())
    }

    fn load_roots(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderRoot>, Error> {
        self.record("load_roots")?;
        Ok(self.matching_roots(predicate, pagination))
    }

    fn load_batch_children(&self, order_ids: &[u64]) -> Result<Vec<ChildRow>, Error> {
        self.record("load_batch_children")?;
        Ok(order_ids
            .iter()
            .flat_map(|&order_id| {
                self.lines_of(order_id)
                    .into_iter()
                    .map(move |line| ChildRow { order_id, line })
            })
            .collect())
    }

    fn load_full_joined(&self, predicate: &OrderPredicate) -> Result<Vec<JoinedRow>, Error> {
        self.record("load_full_joined")?;
        Ok(self.joined(predicate))
    }

    fn load_flat_joined(&self, predicate: &OrderPredicate) -> Result<Vec<OrderFlatDto>, Error> {
        self.record("load_flat_joined")?;
        Ok(self
            .joined(predicate)
            .into_iter()
            .map(|row| OrderFlatDto {
                order_id: row.root.order.id,
                name: row.root.member.name,
                order_date: row.root.order.order_date,
                order_status: row.root.order.status,
                address: row.root.delivery.address,
                item_name: row.line.as_ref().map(|l| l.item.name.clone()),
                order_price: row.line.as_ref().map(|l| l.order_item.order_price),
                count: row.line.as_ref().map(|l| l.order_item.count),
            })
            .collect())
    }
}
