//! Query engine interface consumed by the loading strategies.
//!
//! Each method corresponds to exactly one query against the store. The
//! strategies are written against this trait so their query counts can be
//! asserted independently of any particular backend.

use jpashop_proto::{OrderFlatDto, Pagination};

use crate::error::Error;
use crate::model::{Delivery, Item, Member, Order, OrderItem};

use super::criteria::OrderPredicate;

/// An order joined with its to-one relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRoot {
    pub order: Order,
    pub member: Member,
    pub delivery: Delivery,
}

/// An order item joined with its item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub order_item: OrderItem,
    pub item: Item,
}

/// A child row tagged with the id of the order that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildRow {
    pub order_id: u64,
    pub line: OrderLine,
}

/// One row of the full to-one + to-many join.
///
/// `line` is `None` for an order without items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub root: OrderRoot,
    pub line: Option<OrderLine>,
}

/// Query capabilities of a store, scoped to one request.
pub trait QueryEngine {
    /// Load root orders only; related entities are left unresolved.
    fn scan_orders(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<Order>, Error>;

    /// Load one member by id.
    fn find_member(&self, id: u64) -> Result<Option<Member>, Error>;

    /// Load one delivery by id.
    fn find_delivery(&self, id: u64) -> Result<Option<Delivery>, Error>;

    /// Load one item by id.
    fn find_item(&self, id: u64) -> Result<Option<Item>, Error>;

    /// Load the order items of a single order, without their items.
    fn find_order_items(&self, order_id: u64) -> Result<Vec<OrderItem>, Error>;

    /// Load root orders joined with member and delivery.
    ///
    /// The window is applied to orders, which is sound because neither join
    /// multiplies rows.
    fn load_roots(
        &self,
        predicate: &OrderPredicate,
        pagination: Option<Pagination>,
    ) -> Result<Vec<OrderRoot>, Error>;

    /// Load all order items (joined with item) owned by any of `order_ids`.
    fn load_batch_children(&self, order_ids: &[u64]) -> Result<Vec<ChildRow>, Error>;

    /// Load orders joined with member, delivery, order items and items.
    fn load_full_joined(&self, predicate: &OrderPredicate) -> Result<Vec<JoinedRow>, Error>;

    /// Load the denormalized order x item projection.
    fn load_flat_joined(&self, predicate: &OrderPredicate) -> Result<Vec<OrderFlatDto>, Error>;
}
