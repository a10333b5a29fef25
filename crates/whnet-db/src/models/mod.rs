//! Database entity models for whnet-db.
//!
//! One module per table. Models are plain structs deriving `FromRow` with
//! static async query methods; anything that has to commit together with
//! other writes exposes an `_in_tx` variant.

pub mod region;
pub mod region_home_warehouse;
pub mod warehouse;
pub mod warehouse_priority;
pub mod warehouse_type;

pub use region::Region;
pub use region_home_warehouse::RegionHomeWarehouse;
pub use warehouse::{
    SyncState, Warehouse, WarehouseCharacteristics, WarehouseFilter, WarehouseSaleRegions,
};
pub use warehouse_priority::WarehousePriority;
pub use warehouse_type::WarehouseType;
