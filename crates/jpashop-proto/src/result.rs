//! Output projections for order queries.

use serde::{Deserialize, Serialize};

use crate::value::{Address, OrderStatus};

/// One order with its buyer, delivery address and line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueryDto {
    pub order_id: u64,
    /// Buyer name.
    pub name: String,
    /// Order timestamp in microseconds since Unix epoch.
    pub order_date: i64,
    pub order_status: OrderStatus,
    pub address: Address,
    pub order_items: Vec<OrderItemQueryDto>,
}

impl OrderQueryDto {
    /// Create an order projection with no line items.
    pub fn new(
        order_id: u64,
        name: impl Into<String>,
        order_date: i64,
        order_status: OrderStatus,
        address: Address,
    ) -> Self {
        Self {
            order_id,
            name: name.into(),
            order_date,
            order_status,
            address,
            order_items: Vec::new(),
        }
    }

    /// Attach line items.
    pub fn with_items(mut self, items: Vec<OrderItemQueryDto>) -> Self {
        self.order_items = items;
        self
    }
}

/// One line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemQueryDto {
    pub item_name: String,
    /// Unit price captured when the order was placed.
    pub order_price: u64,
    pub count: u32,
}

impl OrderItemQueryDto {
    /// Create a line item projection.
    pub fn new(item_name: impl Into<String>, order_price: u64, count: u32) -> Self {
        Self {
            item_name: item_name.into(),
            order_price,
            count,
        }
    }
}

/// Denormalized row of an order joined with one of its line items.
///
/// Every row repeats the order-level columns. The line item columns are empty
/// when the order has no items (outer join).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFlatDto {
    pub order_id: u64,
    pub name: String,
    pub order_date: i64,
    pub order_status: OrderStatus,
    pub address: Address,
    pub item_name: Option<String>,
    pub order_price: Option<u64>,
    pub count: Option<u32>,
}

impl OrderFlatDto {
    /// The line item carried by this row, if any.
    pub fn item(&self) -> Option<OrderItemQueryDto> {
        match (&self.item_name, self.order_price, self.count) {
            (Some(name), Some(price), Some(count)) => {
                Some(OrderItemQueryDto::new(name.clone(), price, count))
            }
            _ => None,
        }
    }
}

/// Order with its to-one relations only (no line items).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSimpleQueryDto {
    pub order_id: u64,
    pub name: String,
    pub order_date: i64,
    pub order_status: OrderStatus,
    pub address: Address,
}
