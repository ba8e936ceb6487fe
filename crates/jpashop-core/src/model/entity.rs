//! Persisted entity rows.

use jpashop_proto::{Address, DeliveryStatus, OrderStatus};
use rkyv::{Archive, Deserialize, Serialize};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub price: u64,
    pub stock: u32,
}

/// Shipping record owned by exactly one order.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Delivery {
    pub id: u64,
    pub address: Address,
    pub status: DeliveryStatus,
}

/// An order placed by a member.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    /// Buyer (many-to-one, required).
    pub member_id: u64,
    /// Owned delivery (one-to-one).
    pub delivery_id: u64,
    /// Order timestamp in microseconds since Unix epoch.
    pub order_date: i64,
    pub status: OrderStatus,
}

/// One line of an order. Never exists without its order.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: u64,
    pub order_id: u64,
    pub item_id: u64,
    /// Unit price captured when the order was placed.
    pub order_price: u64,
    pub count: u32,
}

impl OrderItem {
    /// Price of the whole line.
    pub fn total_price(&self) -> u64 {
        self.order_price * u64::from(self.count)
    }
}

/// Requested line when placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub item_id: u64,
    pub count: u32,
}

impl NewOrderLine {
    pub fn new(item_id: u64, count: u32) -> Self {
        Self { item_id, count }
    }
}
