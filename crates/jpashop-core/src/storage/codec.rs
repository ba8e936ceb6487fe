//! rkyv encoding for stored rows.

use crate::error::Error;
use crate::model::{Delivery, Item, Member, Order, OrderItem};

/// A row type persisted in its own sled tree.
pub trait StoredRow: Sized {
    /// Name of the tree holding rows of this type.
    const TREE: &'static str;

    /// Row id (primary key).
    fn id(&self) -> u64;

    /// Serialize the row to bytes.
    fn to_bytes(&self) -> Result<Vec<u8>, Error>;

    /// Deserialize a row from bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error>;
}

macro_rules! stored_row {
    ($row:ty => $tree:literal) => {
        impl StoredRow for $row {
            const TREE: &'static str = $tree;

            fn id(&self) -> u64 {
                self.id
            }

            fn to_bytes(&self) -> Result<Vec<u8>, Error> {
                rkyv::to_bytes::<rkyv::rancor::Error>(self)
                    .map(|v| v.to_vec())
                    .map_err(|e| Error::Serialization(e.to_string()))
            }

            fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
                // sled hands out unaligned buffers
                let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
                aligned.extend_from_slice(bytes);
                rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
                    .map_err(|e| Error::Deserialization(e.to_string()))
            }
        }
    };
}

stored_row!(Member => "member");
stored_row!(Item => "item");
stored_row!(Delivery => "delivery");
stored_row!(Order => "order");
stored_row!(OrderItem => "order_item");
