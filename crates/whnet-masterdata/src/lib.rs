//! Master-data services for the warehouse network.
//!
//! Sits between the RPC surface (out of scope here) and the whnet-db entity
//! store. Owns the pre-commit invariants (uniqueness, GLN/address
//! consistency, type-change guards), the field-mask driven partial updates,
//! and the home-warehouse assignment flow. Every compound write runs in one
//! database transaction.

pub mod error;
pub mod gateway;
pub mod mask;
pub mod models;
pub mod services;
pub mod validation;

pub use error::MasterDataError;
pub use gateway::{PgPriorityGateway, PriorityGateway};
pub use mask::{RegionField, RegionFieldMask};
pub use models::{
    CharacteristicsPatch, CreateRegionRequest, CreateWarehouseRequest, RegionPatch,
    UpdateRegionRequest, UpdateWarehouseRequest,
};
pub use services::region_service::RegionService;
pub use services::warehouse_service::WarehouseService;
