//! Entity graph model.
//!
//! Entities are stored as flat rows that reference each other by id. The
//! ownership graph runs one way only: an [`Order`] owns its [`Delivery`] and
//! its [`OrderItem`]s, and neither navigates back to the order beyond the
//! `order_id` column an order item carries for indexing.

mod entity;
mod relation;

pub use entity::{Delivery, Item, Member, NewOrderLine, Order, OrderItem};
pub use relation::{Cardinality, Relation};
