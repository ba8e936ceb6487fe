//! Batched fan-out loader for order item collections.
//!
//! Algorithm:
//! 1. Collect the distinct order ids of the page, in page order
//! 2. Issue one child query per batch of at most `max_batch_size` ids
//! 3. Build phase: group child rows by owning order id
//! 4. Probe phase: attach each group to its order, empty if absent
//!
//! With the default batch size a page costs exactly one child query on top of
//! the root query, whatever the number of orders or items on it.

use std::collections::{HashMap, HashSet};

use jpashop_proto::{OrderItemQueryDto, OrderQueryDto, OrderSimpleQueryDto};
use tracing::debug;

use crate::error::Error;

use super::engine::{ChildRow, OrderRoot, QueryEngine};

/// Resolves order item collections for a page of root orders.
pub struct BatchedFanOutLoader<'e, E: QueryEngine> {
    engine: &'e E,
    max_batch_size: usize,
}

impl<'e, E: QueryEngine> BatchedFanOutLoader<'e, E> {
    /// Create a loader issuing batches of at most `max_batch_size` ids.
    pub fn new(engine: &'e E, max_batch_size: usize) -> Self {
        Self {
            engine,
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Attach line items to every root of the page.
    ///
    /// The output preserves the page order and contains one record per root,
    /// with an empty item list for orders that have no items.
    pub fn load(&self, roots: Vec<OrderRoot>) -> Result<Vec<OrderQueryDto>, Error> {
        let order_ids = distinct_ids(&roots);
        let mut by_order = self.fetch_grouped(&order_ids)?;

        let mut seen = HashSet::with_capacity(roots.len());
        let mut result = Vec::with_capacity(roots.len());
        for root in roots {
            let order_id = root.order.id;
            let items = if seen.insert(order_id) {
                by_order.remove(&order_id).unwrap_or_default()
            } else {
                // Repeated root on the same page: the first copy took the group
                result
                    .iter()
                    .find(|dto: &&OrderQueryDto| dto.order_id == order_id)
                    .map(|dto| dto.order_items.clone())
                    .unwrap_or_default()
            };
            result.push(root_dto(root).with_items(items));
        }

        Ok(result)
    }

    /// Number of child queries a page with `root_count` distinct orders costs.
    pub fn batches_for(&self, root_count: usize) -> usize {
        root_count.div_ceil(self.max_batch_size)
    }

    fn fetch_grouped(
        &self,
        order_ids: &[u64],
    ) -> Result<HashMap<u64, Vec<OrderItemQueryDto>>, Error> {
        let mut by_order: HashMap<u64, Vec<OrderItemQueryDto>> = HashMap::new();

        for batch in order_ids.chunks(self.max_batch_size) {
            let rows = self.engine.load_batch_children(batch)?;
            debug!(batch_size = batch.len(), rows = rows.len(), "fan-out batch loaded");

            for row in rows {
                let ChildRow { order_id, line } = row;
                by_order
                    .entry(order_id)
                    .or_default()
                    .push(OrderItemQueryDto::new(
                        line.item.name,
                        line.order_item.order_price,
                        line.order_item.count,
                    ));
            }
        }

        Ok(by_order)
    }
}

/// Distinct order ids of a page, in first-seen order.
fn distinct_ids(roots: &[OrderRoot]) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(roots.len());
    roots
        .iter()
        .map(|root| root.order.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Project a root order without its items.
pub(crate) fn root_dto(root: OrderRoot) -> OrderQueryDto {
    OrderQueryDto::new(
        root.order.id,
        root.member.name,
        root.order.order_date,
        root.order.status,
        root.delivery.address,
    )
}

/// Project a root order onto the simple (to-one only) view.
pub(crate) fn simple_dto(root: OrderRoot) -> OrderSimpleQueryDto {
    OrderSimpleQueryDto {
        order_id: root.order.id,
        name: root.member.name,
        order_date: root.order.order_date,
        order_status: root.order.status,
        address: root.delivery.address,
    }
}
