//! Order store backed by sled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use jpashop_proto::{Address, DeliveryStatus, OrderStatus};
use sled::{Db, Tree};
use tracing::{debug, info};

use super::codec::StoredRow;
use super::key::{current_timestamp, encode_id, order_item_index_key};
use super::{Session, StorageConfig};
use crate::error::Error;
use crate::model::{Delivery, Item, Member, NewOrderLine, Order, OrderItem};

/// Tree name for the order items by order index.
const ORDER_ITEM_INDEX_TREE: &str = "index:order_item_by_order";

/// The order store.
///
/// Every entity type lives in its own tree keyed by big-endian id, so a full
/// scan returns rows in insertion order. Order items are additionally
/// indexed by owning order.
pub struct ShopStore {
    db: Db,
    pub(crate) members: Tree,
    pub(crate) items: Tree,
    pub(crate) deliveries: Tree,
    pub(crate) orders: Tree,
    pub(crate) order_items: Tree,
    pub(crate) order_item_index: Tree,
    /// Queries served by all sessions since the store was opened.
    queries: AtomicU64,
}

impl ShopStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;

        let store = Self {
            members: db.open_tree(Member::TREE)?,
            items: db.open_tree(Item::TREE)?,
            deliveries: db.open_tree(Delivery::TREE)?,
            orders: db.open_tree(Order::TREE)?,
            order_items: db.open_tree(OrderItem::TREE)?,
            order_item_index: db.open_tree(ORDER_ITEM_INDEX_TREE)?,
            db,
            queries: AtomicU64::new(0),
        };

        info!(
            recovered = store.db.was_recovered(),
            orders = store.orders.len(),
            "order store opened"
        );
        Ok(store)
    }

    /// Check if the database was recovered from a previous crash.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Whether the store holds no members yet.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Open a request-scoped session.
    pub fn session(&self) -> Session<'_> {
        Session::new(self)
    }

    /// Total queries served by every session of this store.
    pub fn queries_issued(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub(crate) fn record_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<usize, Error> {
        Ok(self.db.flush()?)
    }

    // ========== Writes ==========

    /// Register a member.
    pub fn save_member(&self, name: impl Into<String>) -> Result<Member, Error> {
        let member = Member {
            id: self.next_id()?,
            name: name.into(),
        };
        put(&self.members, &member)?;
        debug!(member_id = member.id, "member saved");
        Ok(member)
    }

    /// Register an item with its unit price and stock.
    pub fn save_item(&self, name: impl Into<String>, price: u64, stock: u32) -> Result<Item, Error> {
        let item = Item {
            id: self.next_id()?,
            name: name.into(),
            price,
            stock,
        };
        put(&self.items, &item)?;
        debug!(item_id = item.id, "item saved");
        Ok(item)
    }

    /// Place an order for `member_id`, shipped to `address`.
    ///
    /// Each line captures the item's current price and takes its count out
    /// of the item's stock. Every line is validated before anything is
    /// written, so a rejected order leaves the store untouched.
    pub fn place_order(
        &self,
        member_id: u64,
        address: Address,
        lines: &[NewOrderLine],
    ) -> Result<Order, Error> {
        if self.find_member(member_id)?.is_none() {
            return Err(Error::NotFound);
        }

        let mut items: HashMap<u64, Item> = HashMap::new();
        for line in lines {
            if line.count == 0 {
                return Err(Error::InvalidData(format!(
                    "order line for item {} has a zero count",
                    line.item_id
                )));
            }
            if !items.contains_key(&line.item_id) {
                let item = get::<Item>(&self.items, line.item_id)?.ok_or(Error::NotFound)?;
                items.insert(line.item_id, item);
            }
            let item = items.get_mut(&line.item_id).ok_or(Error::NotFound)?;
            item.stock = item.stock.checked_sub(line.count).ok_or_else(|| {
                Error::InvalidData(format!("not enough stock for item {}", line.item_id))
            })?;
        }

        let delivery = Delivery {
            id: self.next_id()?,
            address,
            status: DeliveryStatus::Ready,
        };
        let order = Order {
            id: self.next_id()?,
            member_id,
            delivery_id: delivery.id,
            order_date: current_timestamp(),
            status: OrderStatus::Order,
        };
        put(&self.deliveries, &delivery)?;
        put(&self.orders, &order)?;

        for line in lines {
            let item = items.get(&line.item_id).ok_or(Error::NotFound)?;
            let order_item = OrderItem {
                id: self.next_id()?,
                order_id: order.id,
                item_id: line.item_id,
                order_price: item.price,
                count: line.count,
            };
            put(&self.order_items, &order_item)?;
            self.order_item_index
                .insert(order_item_index_key(order.id, order_item.id), &[])?;
        }
        for item in items.values() {
            put(&self.items, item)?;
        }

        debug!(order_id = order.id, lines = lines.len(), "order placed");
        Ok(order)
    }

    // ========== Point reads ==========

    pub fn find_member(&self, id: u64) -> Result<Option<Member>, Error> {
        get(&self.members, id)
    }

    /// All members in registration order.
    pub fn find_members(&self) -> Result<Vec<Member>, Error> {
        scan(&self.members)
    }

    /// Members whose name equals `name` exactly.
    pub fn find_members_by_name(&self, name: &str) -> Result<Vec<Member>, Error> {
        Ok(self
            .find_members()?
            .into_iter()
            .filter(|member| member.name == name)
            .collect())
    }

    pub fn find_item(&self, id: u64) -> Result<Option<Item>, Error> {
        get(&self.items, id)
    }

    pub fn find_order(&self, id: u64) -> Result<Option<Order>, Error> {
        get(&self.orders, id)
    }

    fn next_id(&self) -> Result<u64, Error> {
        // Ids start at 1
        Ok(self.db.generate_id()? + 1)
    }
}

pub(crate) fn put<R: StoredRow>(tree: &Tree, row: &R) -> Result<(), Error> {
    tree.insert(encode_id(row.id()), row.to_bytes()?)?;
    Ok(())
}

pub(crate) fn get<R: StoredRow>(tree: &Tree, id: u64) -> Result<Option<R>, Error> {
    match tree.get(encode_id(id))? {
        Some(bytes) => Ok(Some(R::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

pub(crate) fn scan<R: StoredRow>(tree: &Tree) -> Result<Vec<R>, Error> {
    tree.iter()
        .values()
        .map(|value| R::from_bytes(&value?))
        .collect()
}
