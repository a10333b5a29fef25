//! PostgreSQL access layer for the warehouse network.
//!
//! This crate owns the durable state: the live `warehouses` and `regions`
//! tables, their append-only `_history` shadows, the region home-warehouse
//! assignments, and the warehouse priority rows. Models are plain structs
//! with static query methods; mutating methods that must participate in a
//! larger unit of work take a `Transaction` (`_in_tx` variants) so services
//! can compose them atomically.
//!
//! History rule: every update or delete of a warehouse or region first
//! copies the pre-change row into the history table, with its validity
//! interval closed at the statement's timestamp, inside the same statement.

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::DbError;
pub use migrations::run_migrations;
pub use models::region::Region;
pub use models::region_home_warehouse::RegionHomeWarehouse;
pub use models::warehouse::{
    SyncState, Warehouse, WarehouseCharacteristics, WarehouseFilter, WarehouseSaleRegions,
};
pub use models::warehouse_priority::WarehousePriority;
pub use models::warehouse_type::WarehouseType;
pub use pool::DbPool;
