//! Region model.
//!
//! Regions form a tree through `region_parent_id`; the store does not
//! enforce acyclicity. Updates and deletes snapshot the pre-change row into
//! `regions_history` within the same statement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use whnet_core::{ClusterId, RegionId, WarehouseId};

use crate::error::DbError;

const REGION_COLUMNS: &str = r"region_id,
       region_name,
       region_title,
       region_parent_id,
       cluster_id,
       region_update_priorities_enabled,
       region_edited_by,
       region_updated";

/// Copy of the current row into the history table, parameterized by the
/// predicate appended after `FROM regions`.
const REGION_HISTORY_INSERT: &str = r"
    INSERT INTO regions_history (region_id,
                                 region_name,
                                 region_title,
                                 region_parent_id,
                                 cluster_id,
                                 region_update_priorities_enabled,
                                 region_edited_by,
                                 region_updated)
    SELECT region_id,
           region_name,
           region_title,
           region_parent_id,
           cluster_id,
           region_update_priorities_enabled,
           region_edited_by,
           region_updated
    FROM regions";

/// A sales region.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Region {
    pub region_id: RegionId,

    /// Machine-facing name.
    #[sqlx(rename = "region_name")]
    pub name: String,

    /// Human-facing title.
    #[sqlx(rename = "region_title")]
    pub title: String,

    /// Parent region, if any.
    #[sqlx(rename = "region_parent_id")]
    pub parent_id: Option<RegionId>,

    pub cluster_id: ClusterId,

    /// When flipped on, region priorities are re-synchronized downstream.
    #[sqlx(rename = "region_update_priorities_enabled")]
    pub update_priorities_enabled: bool,

    /// Actor of the last write.
    #[sqlx(rename = "region_edited_by")]
    pub edited_by: String,

    /// Timestamp of the last write.
    #[sqlx(rename = "region_updated")]
    pub updated: DateTime<Utc>,
}

impl Region {
    /// Insert a new region.
    pub async fn create(pool: &PgPool, region: &Region) -> Result<(), DbError> {
        sqlx::query(
            r"
            INSERT INTO regions (region_id,
                                 region_name,
                                 region_title,
                                 region_parent_id,
                                 cluster_id,
                                 region_update_priorities_enabled,
                                 region_edited_by,
                                 region_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(region.region_id)
        .bind(&region.name)
        .bind(&region.title)
        .bind(region.parent_id)
        .bind(region.cluster_id)
        .bind(region.update_priorities_enabled)
        .bind(&region.edited_by)
        .bind(region.updated)
        .execute(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(())
    }

    /// List regions by id set (empty set = all), ordered by id so iteration
    /// is stable across calls.
    pub async fn list(pool: &PgPool, region_ids: &[RegionId]) -> Result<Vec<Self>, DbError> {
        let query = format!(
            r"
            SELECT {REGION_COLUMNS}
            FROM regions
            WHERE cardinality($1) = 0 OR region_id = ANY($1)
            ORDER BY region_id
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(region_ids)
            .fetch_all(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// List regions by cluster set (empty set = all), ordered by id.
    pub async fn list_by_cluster(
        pool: &PgPool,
        cluster_ids: &[ClusterId],
    ) -> Result<Vec<Self>, DbError> {
        let query = format!(
            r"
            SELECT {REGION_COLUMNS}
            FROM regions
            WHERE cardinality($1) = 0 OR cluster_id = ANY($1)
            ORDER BY region_id
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(cluster_ids)
            .fetch_all(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// List regions whose home warehouse is in the given set (empty set =
    /// all regions), ordered by title.
    pub async fn list_by_home_warehouse(
        pool: &PgPool,
        warehouse_ids: &[WarehouseId],
    ) -> Result<Vec<Self>, DbError> {
        let query = format!(
            r"
            SELECT {REGION_COLUMNS}
            FROM regions
            WHERE (cardinality($1) = 0 OR
                   region_id IN (
                       SELECT region_id
                       FROM region_home_warehouses
                       WHERE warehouse_id = ANY($1))
                  )
            ORDER BY region_title
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(warehouse_ids)
            .fetch_all(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// Find a region by id.
    pub async fn find(pool: &PgPool, id: RegionId) -> Result<Option<Self>, DbError> {
        let query = format!(
            r"
            SELECT {REGION_COLUMNS}
            FROM regions
            WHERE region_id = $1
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// Find a region by id, failing with `DbError::NotFound` when absent.
    pub async fn find_required(pool: &PgPool, id: RegionId) -> Result<Self, DbError> {
        Self::find(pool, id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("region with id {id}")))
    }

    /// Rewrite the row, snapshotting the pre-change version into history in
    /// the same statement. Blank name/title in the payload keep the stored
    /// values. Returns the committed row, or `None` when the id is absent.
    pub async fn update_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        region: &Region,
    ) -> Result<Option<Self>, DbError> {
        let query = format!(
            r"
            WITH history AS (
                {REGION_HISTORY_INSERT}
                WHERE region_id = $1
            )
            UPDATE regions
            SET region_name = COALESCE(NULLIF($2, ''), region_name),
                region_title = COALESCE(NULLIF($3, ''), region_title),
                region_parent_id = $4,
                cluster_id = $5,
                region_update_priorities_enabled = $6,
                region_edited_by = $7,
                region_updated = $8
            WHERE region_id = $1
            RETURNING {REGION_COLUMNS}
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(region.region_id)
            .bind(&region.name)
            .bind(&region.title)
            .bind(region.parent_id)
            .bind(region.cluster_id)
            .bind(region.update_priorities_enabled)
            .bind(&region.edited_by)
            .bind(region.updated)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// Delete regions by id, snapshotting each into history first. Absent
    /// ids are silently skipped. Returns the number of rows removed.
    pub async fn delete_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        region_ids: &[RegionId],
    ) -> Result<u64, DbError> {
        let query = format!(
            r"
            WITH history AS (
                {REGION_HISTORY_INSERT}
                WHERE region_id = ANY($1)
            )
            DELETE FROM regions
            WHERE region_id = ANY($1)
            "
        );

        let result = sqlx::query(&query)
            .bind(region_ids)
            .execute(&mut **tx)
            .await
            .map_err(DbError::QueryFailed)?;

        Ok(result.rows_affected())
    }
}
