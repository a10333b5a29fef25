//! Fixed warehouse type catalog.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use whnet_core::WarehouseTypeId;

use crate::error::DbError;

/// Catalog types that hold stock. Region home assignment and storage
/// listings are restricted to these.
pub const STORAGE_TYPE_IDS: [WarehouseTypeId; 2] =
    [WarehouseTypeId::new(1), WarehouseTypeId::new(4)];

/// The type used for warehouses participating in automatic replenishment.
pub const AUTO_REPLENISHMENT_TYPE_ID: WarehouseTypeId = WarehouseTypeId::new(5);

/// An entry of the warehouse type catalog. Seeded by migration, read-only
/// at runtime.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WarehouseType {
    pub warehouse_type_id: WarehouseTypeId,

    #[sqlx(rename = "warehouse_type_name")]
    pub name: String,
}

impl WarehouseType {
    /// The full catalog, ordered by id.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, DbError> {
        sqlx::query_as(
            r"
            SELECT warehouse_type_id, warehouse_type_name
            FROM warehouse_types
            ORDER BY warehouse_type_id
            ",
        )
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Whether the id exists in the catalog.
    pub async fn exists(pool: &PgPool, id: WarehouseTypeId) -> Result<bool, DbError> {
        let result: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(SELECT 1 FROM warehouse_types WHERE warehouse_type_id = $1)
            ",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(result.0)
    }

    /// Whether the id designates a storage warehouse type.
    #[must_use]
    pub fn is_storage(id: WarehouseTypeId) -> bool {
        STORAGE_TYPE_IDS.contains(&id)
    }
}
