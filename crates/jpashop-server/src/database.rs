//! Database wrapper around the order store.

use std::sync::Arc;

use tracing::info;

use jpashop_core::{NewOrderLine, ShopStore, StorageConfig};
use jpashop_proto::Address;

use crate::config::ServerConfig;
use crate::error::Error;

/// Shared database handle.
pub type SharedDatabase = Arc<Database>;

/// Database wrapper that owns the order store.
pub struct Database {
    store: ShopStore,
}

impl Database {
    /// Open the database described by `config`, seeding it if requested.
    pub fn open(config: &ServerConfig) -> Result<Self, Error> {
        let storage = if config.temporary {
            StorageConfig::temporary()
        } else {
            std::fs::create_dir_all(&config.data_path).map_err(|e| {
                Error::Database(format!("failed to create data directory: {}", e))
            })?;
            StorageConfig::new(config.data_path.join("storage"))
        };

        let store = ShopStore::open(storage)
            .map_err(|e| Error::Database(format!("failed to open storage: {}", e)))?;
        let database = Self { store };

        if config.seed {
            database.seed()?;
        }

        Ok(database)
    }

    /// Get a reference to the order store.
    pub fn store(&self) -> &ShopStore {
        &self.store
    }

    /// Insert the demo data set unless the store already has members.
    ///
    /// Returns whether anything was written.
    pub fn seed(&self) -> Result<bool, Error> {
        if !self.store.is_empty() {
            return Ok(false);
        }

        let store = &self.store;
        let user_a = store.save_member("userA")?;
        let user_b = store.save_member("userB")?;

        let jpa1 = store.save_item("JPA1 BOOK", 10000, 100)?;
        let jpa2 = store.save_item("JPA2 BOOK", 20000, 100)?;
        let spring1 = store.save_item("SPRING1 BOOK", 20000, 200)?;
        let spring2 = store.save_item("SPRING2 BOOK", 40000, 300)?;

        store.place_order(
            user_a.id,
            Address::new("Seoul", "1", "1111"),
            &[NewOrderLine::new(jpa1.id, 1), NewOrderLine::new(jpa2.id, 2)],
        )?;
        store.place_order(
            user_b.id,
            Address::new("Jinju", "2", "2222"),
            &[NewOrderLine::new(spring1.id, 3), NewOrderLine::new(spring2.id, 4)],
        )?;

        store.flush()?;
        info!(members = 2, orders = 2, "demo data seeded");
        Ok(true)
    }
}
