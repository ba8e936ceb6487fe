//! Row key encoding.

/// Size of an encoded row id in bytes.
pub const ID_SIZE: usize = 8;

/// Encode a row id so that sled's byte order matches numeric order.
pub fn encode_id(id: u64) -> [u8; ID_SIZE] {
    id.to_be_bytes()
}

/// Decode a row id from the first [`ID_SIZE`] bytes of `bytes`.
pub fn decode_id(bytes: &[u8]) -> Option<u64> {
    let raw: [u8; ID_SIZE] = bytes.get(..ID_SIZE)?.try_into().ok()?;
    Some(u64::from_be_bytes(raw))
}

/// Key of the order-item-by-order index: order id followed by order item id.
pub fn order_item_index_key(order_id: u64, order_item_id: u64) -> [u8; ID_SIZE * 2] {
    let mut key = [0u8; ID_SIZE * 2];
    key[..ID_SIZE].copy_from_slice(&encode_id(order_id));
    key[ID_SIZE..].copy_from_slice(&encode_id(order_item_id));
    key
}

/// Get current timestamp in microseconds since Unix epoch.
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
