//! Reshaping joined result sets into nested order records.
//!
//! Two assemblers live here. [`FlatRowAssembler`] groups denormalized
//! projection rows by the full order-level tuple. [`dedup_joined`] collapses
//! entity rows of the full join by order identity. Neither touches the store.

use std::collections::HashMap;

use jpashop_proto::{Address, OrderFlatDto, OrderItemQueryDto, OrderQueryDto, OrderStatus};

use super::engine::JoinedRow;
use super::fanout::root_dto;

/// Group key: every order-level column of a flat row.
#[derive(Debug, PartialEq, Eq, Hash)]
struct RootKey<'a> {
    order_id: u64,
    name: &'a str,
    order_date: i64,
    status: OrderStatus,
    address: &'a Address,
}

impl<'a> RootKey<'a> {
    fn of(row: &'a OrderFlatDto) -> Self {
        Self {
            order_id: row.order_id,
            name: &row.name,
            order_date: row.order_date,
            status: row.order_status,
            address: &row.address,
        }
    }
}

/// Groups flat order x item rows into one record per order.
pub struct FlatRowAssembler;

impl FlatRowAssembler {
    /// Assemble nested records from flat rows.
    ///
    /// Groups are emitted in first-seen order and items keep their row order
    /// within a group. A row without item columns contributes its group but
    /// no item, so an order without items yields one record with an empty
    /// list.
    pub fn assemble(rows: &[OrderFlatDto]) -> Vec<OrderQueryDto> {
        let mut index: HashMap<RootKey<'_>, usize> = HashMap::new();
        let mut result: Vec<OrderQueryDto> = Vec::new();

        for row in rows {
            let slot = *index.entry(RootKey::of(row)).or_insert_with(|| {
                result.push(OrderQueryDto::new(
                    row.order_id,
                    row.name.clone(),
                    row.order_date,
                    row.order_status,
                    row.address.clone(),
                ));
                result.len() - 1
            });

            if let Some(item) = row.item() {
                result[slot].order_items.push(item);
            }
        }

        result
    }
}

/// Collapse full-join rows to one record per distinct order id.
///
/// Rows belonging to the same order repeat the same root entity; the first
/// occurrence fixes the order's position in the output.
pub fn dedup_joined(rows: Vec<JoinedRow>) -> Vec<OrderQueryDto> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut result: Vec<OrderQueryDto> = Vec::new();

    for JoinedRow { root, line } in rows {
        let order_id = root.order.id;
        let slot = match index.get(&order_id) {
            Some(&slot) => slot,
            None => {
                result.push(root_dto(root));
                index.insert(order_id, result.len() - 1);
                result.len() - 1
            }
        };

        if let Some(line) = line {
            result[slot].order_items.push(OrderItemQueryDto::new(
                line.item.name,
                line.order_item.order_price,
                line.order_item.count,
            ));
        }
    }

    result
}
