//! Region/warehouse priority rows.
//!
//! Owned by the priority collaborator; this crate reads them to answer
//! "does this warehouse have priorities" (which forbids type changes) and
//! to aggregate sale regions.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use whnet_core::{RegionId, WarehouseId};

use crate::error::DbError;

/// A priority record linking a region to a warehouse.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WarehousePriority {
    pub region_id: RegionId,
    pub warehouse_id: WarehouseId,
    pub priority: i32,
}

impl WarehousePriority {
    /// List priorities filtered by region and/or warehouse sets (empty set =
    /// no filter on that axis).
    pub async fn list(
        pool: &PgPool,
        region_ids: &[RegionId],
        warehouse_ids: &[WarehouseId],
    ) -> Result<Vec<Self>, DbError> {
        sqlx::query_as(
            r"
            SELECT region_id, warehouse_id, priority
            FROM warehouse_priorities
            WHERE (cardinality($1) = 0 OR region_id = ANY($1))
              AND (cardinality($2) = 0 OR warehouse_id = ANY($2))
            ORDER BY region_id, priority
            ",
        )
        .bind(region_ids)
        .bind(warehouse_ids)
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }
}
