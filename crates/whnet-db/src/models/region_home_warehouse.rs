//! Home warehouse assignment for regions.
//!
//! One row per region; assigning a new home warehouse replaces the previous
//! assignment (last writer wins), stamped with the acting user and time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use whnet_core::{RegionId, WarehouseId};

use crate::error::DbError;

/// A region's designated home warehouse.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RegionHomeWarehouse {
    pub region_id: RegionId,
    pub warehouse_id: WarehouseId,
    pub assigned_by: String,
    pub assigned_at: DateTime<Utc>,
}

impl RegionHomeWarehouse {
    /// Upsert home-warehouse assignments.
    ///
    /// Runs inside the caller's transaction so an assignment created
    /// alongside a warehouse write commits or rolls back with it.
    pub async fn upsert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        pairs: &[(RegionId, WarehouseId)],
        assigned_by: &str,
    ) -> Result<(), DbError> {
        for (region_id, warehouse_id) in pairs {
            sqlx::query(
                r"
                INSERT INTO region_home_warehouses (region_id, warehouse_id, assigned_by, assigned_at)
                VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
                ON CONFLICT (region_id) DO UPDATE
                SET warehouse_id = EXCLUDED.warehouse_id,
                    assigned_by = EXCLUDED.assigned_by,
                    assigned_at = EXCLUDED.assigned_at
                ",
            )
            .bind(region_id)
            .bind(warehouse_id)
            .bind(assigned_by)
            .execute(&mut **tx)
            .await
            .map_err(DbError::QueryFailed)?;
        }

        Ok(())
    }

    /// List assignments for a region set (empty set = all), ordered by
    /// region id.
    pub async fn list(pool: &PgPool, region_ids: &[RegionId]) -> Result<Vec<Self>, DbError> {
        sqlx::query_as(
            r"
            SELECT region_id, warehouse_id, assigned_by, assigned_at
            FROM region_home_warehouses
            WHERE cardinality($1) = 0 OR region_id = ANY($1)
            ORDER BY region_id
            ",
        )
        .bind(region_ids)
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

}
