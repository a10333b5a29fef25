//! Warehouse model and its synchronization columns.
//!
//! The live `warehouses` table carries, besides the master data itself, the
//! two columns the synchronization queue runs on: `warehouse_is_synchronized`
//! and `warehouse_synchronized_at`. The synchronization state is never stored
//! as its own column, it is computed from those two (see [`SyncState`]).
//!
//! Updates are conditional: the row is rewritten, and the pre-change version
//! snapshotted into `warehouses_history`, only when one of the tracked fields
//! (name, type, GLN, address, characteristics) actually differs. A no-op
//! update leaves both tables untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use whnet_core::{RegionId, WarehouseId, WarehouseTypeId};

use crate::error::DbError;
use crate::models::warehouse_type::STORAGE_TYPE_IDS;

/// Column list shared by every query that materializes a [`Warehouse`].
const WAREHOUSE_COLUMNS: &str = r"warehouse_id,
       warehouse_name,
       warehouse_rezon_id,
       warehouse_metazon_id,
       warehouse_address,
       warehouse_gln,
       warehouse_type_id,
       warehouse_characteristics,
       warehouse_goodzon_id,
       warehouse_new_type,
       warehouse_assignment,
       warehouse_management_system,
       warehouse_created_by,
       warehouse_is_synchronized,
       warehouse_synchronized_at";

/// Insert of the pre-change row into the history table. Chained behind an
/// `updated` CTE so it only fires for rows the conditional update touched;
/// since all parts of one statement read the same snapshot, the SELECT sees
/// the values from before the update.
const WAREHOUSE_HISTORY_INSERT: &str = r"
INSERT INTO warehouses_history (warehouse_id,
                                warehouse_name,
                                warehouse_rezon_id,
                                warehouse_metazon_id,
                                warehouse_address,
                                warehouse_gln,
                                warehouse_type_id,
                                warehouse_created_by,
                                warehouse_sys_period,
                                warehouse_goodzon_id,
                                warehouse_characteristics)
SELECT warehouses.warehouse_id,
       warehouses.warehouse_name,
       warehouses.warehouse_rezon_id,
       warehouses.warehouse_metazon_id,
       warehouses.warehouse_address,
       warehouses.warehouse_gln,
       warehouses.warehouse_type_id,
       warehouses.warehouse_created_by,
       tstzrange(lower(warehouses.warehouse_sys_period), CURRENT_TIMESTAMP),
       warehouses.warehouse_goodzon_id,
       warehouses.warehouse_characteristics
FROM warehouses";

/// Structured bag of warehouse capability flags, stored as JSONB.
///
/// `auto_replenishment` and `closed` are operator-managed: partial updates
/// coming through the service layer must preserve the stored values for
/// those two, see the service-side merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseCharacteristics {
    /// Goods are accepted by barcode only.
    pub barcode_only: bool,
    /// The warehouse runs a WMS.
    pub uses_wms: bool,
    /// Transit node, goods do not rest here.
    pub is_transit: bool,
    /// Handles customer refunds.
    pub is_refund: bool,
    /// Included in automatic replenishment.
    pub auto_replenishment: bool,
    /// Closed for operations.
    pub closed: bool,
}

/// Synchronization state of a warehouse against the external master-data
/// system, computed from the two persisted columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Never pushed to the external system.
    Never,
    /// Pushed before, local changes pending.
    Outdated,
    /// External system holds the current data.
    Synced,
}

impl SyncState {
    /// Derive the state from the persisted column pair.
    #[must_use]
    pub fn from_columns(is_synchronized: bool, synchronized_at: Option<DateTime<Utc>>) -> Self {
        match (is_synchronized, synchronized_at) {
            (true, _) => SyncState::Synced,
            (false, Some(_)) => SyncState::Outdated,
            (false, None) => SyncState::Never,
        }
    }
}

/// Filter for warehouse listing. Empty id/type sets mean "no filter";
/// `search_name` matches as a case- and padding-insensitive substring.
#[derive(Debug, Clone, Default)]
pub struct WarehouseFilter {
    pub warehouse_ids: Vec<WarehouseId>,
    pub type_ids: Vec<WarehouseTypeId>,
    pub search_name: Option<String>,
}

impl WarehouseFilter {
    /// Filter by an explicit id set.
    #[must_use]
    pub fn by_ids(warehouse_ids: Vec<WarehouseId>) -> Self {
        Self {
            warehouse_ids,
            ..Self::default()
        }
    }

    /// Filter by a type-id set.
    #[must_use]
    pub fn by_types(type_ids: Vec<WarehouseTypeId>) -> Self {
        Self {
            type_ids,
            ..Self::default()
        }
    }
}

/// A warehouse of the network.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Warehouse {
    /// Clearing identifier, assigned at registration, globally unique.
    pub warehouse_id: WarehouseId,

    /// Display name, unique among live rows.
    #[sqlx(rename = "warehouse_name")]
    pub name: String,

    /// Legacy identifier in the rezon system, unique.
    #[sqlx(rename = "warehouse_rezon_id")]
    pub rezon_id: i64,

    /// Legacy identifier in the metazon system, unique.
    #[sqlx(rename = "warehouse_metazon_id")]
    pub metazon_id: i64,

    /// Legal address.
    #[sqlx(rename = "warehouse_address")]
    pub address: String,

    /// Optional GS1 location code. Warehouses sharing a GLN must share an
    /// address.
    #[sqlx(rename = "warehouse_gln")]
    pub gln: Option<String>,

    /// Foreign key into the fixed warehouse type catalog.
    #[sqlx(rename = "warehouse_type_id")]
    pub type_id: WarehouseTypeId,

    /// Capability flags, stored as JSONB.
    #[sqlx(rename = "warehouse_characteristics")]
    pub characteristics: Json<WarehouseCharacteristics>,

    /// Identity assigned by the external master-data system after the first
    /// successful push.
    #[sqlx(rename = "warehouse_goodzon_id")]
    pub goodzon_id: Option<i64>,

    /// Row was created under the new type catalog.
    #[sqlx(rename = "warehouse_new_type")]
    pub new_type: bool,

    /// Free-form assignment tag.
    #[sqlx(rename = "warehouse_assignment")]
    pub assignment: Option<String>,

    /// Name of the management system running the warehouse.
    #[sqlx(rename = "warehouse_management_system")]
    pub management_system: Option<String>,

    /// Actor of the last write.
    #[sqlx(rename = "warehouse_created_by")]
    pub created_by: String,

    #[sqlx(rename = "warehouse_is_synchronized")]
    pub is_synchronized: bool,

    #[sqlx(rename = "warehouse_synchronized_at")]
    pub synchronized_at: Option<DateTime<Utc>>,
}

/// Per-warehouse aggregation of the regions it serves, derived from
/// priority rows (a region matches when the priority names it or its
/// parent).
#[derive(Debug, Clone, FromRow)]
pub struct WarehouseSaleRegions {
    pub warehouse_id: WarehouseId,
    pub region_ids: Vec<RegionId>,
}

impl Warehouse {
    /// Synchronization state derived from the persisted columns.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        SyncState::from_columns(self.is_synchronized, self.synchronized_at)
    }

    /// Insert a new warehouse in state "never synchronized".
    ///
    /// Takes a transaction so a home-region assignment created alongside
    /// commits or rolls back with the row.
    pub async fn create_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        warehouse: &Warehouse,
        created_by: &str,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"
            INSERT INTO warehouses (warehouse_id,
                                    warehouse_name,
                                    warehouse_rezon_id,
                                    warehouse_metazon_id,
                                    warehouse_address,
                                    warehouse_gln,
                                    warehouse_type_id,
                                    warehouse_created_by,
                                    warehouse_sys_period,
                                    warehouse_characteristics,
                                    warehouse_new_type,
                                    warehouse_assignment,
                                    warehouse_management_system,
                                    warehouse_is_synchronized,
                                    warehouse_synchronized_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    tstzrange(CURRENT_TIMESTAMP, NULL),
                    $9, $10, $11, $12, FALSE, NULL)
            ",
        )
        .bind(warehouse.warehouse_id)
        .bind(&warehouse.name)
        .bind(warehouse.rezon_id)
        .bind(warehouse.metazon_id)
        .bind(&warehouse.address)
        .bind(&warehouse.gln)
        .bind(warehouse.type_id)
        .bind(created_by)
        .bind(&warehouse.characteristics)
        .bind(warehouse.new_type)
        .bind(&warehouse.assignment)
        .bind(&warehouse.management_system)
        .execute(&mut **tx)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(())
    }

    /// List warehouses matching the filter, ordered by name.
    pub async fn list(pool: &PgPool, filter: &WarehouseFilter) -> Result<Vec<Self>, DbError> {
        let query = format!(
            r"
            SELECT {WAREHOUSE_COLUMNS}
            FROM warehouses
            WHERE (cardinality($1) = 0 OR warehouse_id = ANY($1))
              AND (cardinality($2) = 0 OR warehouse_type_id = ANY($2))
              AND (LOWER(TRIM(BOTH FROM warehouse_name)) LIKE $3)
            ORDER BY warehouse_name ASC
            "
        );

        let pattern = format!(
            "%{}%",
            filter
                .search_name
                .as_deref()
                .unwrap_or("")
                .trim()
                .to_lowercase()
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(&filter.warehouse_ids)
            .bind(&filter.type_ids)
            .bind(pattern)
            .fetch_all(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// List warehouses whose type belongs to the storage subset of the
    /// catalog, ordered by name.
    pub async fn list_storage(pool: &PgPool) -> Result<Vec<Self>, DbError> {
        Self::list(
            pool,
            &WarehouseFilter::by_types(STORAGE_TYPE_IDS.to_vec()),
        )
        .await
    }

    /// Find a warehouse by id.
    pub async fn find(pool: &PgPool, id: WarehouseId) -> Result<Option<Self>, DbError> {
        let query = format!(
            r"
            SELECT {WAREHOUSE_COLUMNS}
            FROM warehouses
            WHERE warehouse_id = $1
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// Find a warehouse by id, failing with `DbError::NotFound` when absent.
    pub async fn find_required(pool: &PgPool, id: WarehouseId) -> Result<Self, DbError> {
        Self::find(pool, id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("warehouse with id {id}")))
    }

    /// Conditional update with a history snapshot.
    ///
    /// Rewrites the row and appends the pre-change version to
    /// `warehouses_history` in one statement, but only when name, type, GLN,
    /// address, or characteristics actually differ from the stored values.
    /// Returns `false` when nothing differed (no history row is written) or
    /// when the id does not exist.
    pub async fn update_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        warehouse: &Warehouse,
        edited_by: &str,
    ) -> Result<bool, DbError> {
        let query = format!(
            r"
            WITH updated AS (
                UPDATE warehouses
                SET warehouse_name = $2,
                    warehouse_type_id = $3,
                    warehouse_gln = $4,
                    warehouse_address = $5,
                    warehouse_characteristics = $6,
                    warehouse_created_by = $7,
                    warehouse_sys_period = tstzrange(CURRENT_TIMESTAMP, NULL)
                WHERE warehouse_id = $1
                  AND (warehouse_name != $2
                       OR warehouse_type_id != $3
                       OR warehouse_gln IS DISTINCT FROM $4
                       OR warehouse_address != $5
                       OR warehouse_characteristics != $6)
                RETURNING warehouse_id
            )
            {WAREHOUSE_HISTORY_INSERT}
            JOIN updated USING (warehouse_id)
            "
        );

        let result = sqlx::query(&query)
            .bind(warehouse.warehouse_id)
            .bind(&warehouse.name)
            .bind(warehouse.type_id)
            .bind(&warehouse.gln)
            .bind(&warehouse.address)
            .bind(&warehouse.characteristics)
            .bind(edited_by)
            .execute(&mut **tx)
            .await
            .map_err(DbError::QueryFailed)?;

        Ok(result.rows_affected() > 0)
    }

    /// All live rows colliding with any of the four uniqueness keys.
    ///
    /// Feeds the duplicate check on create; the caller reports the first
    /// violation in key priority order.
    pub async fn find_conflicting(
        pool: &PgPool,
        warehouse_id: WarehouseId,
        name: &str,
        rezon_id: i64,
        metazon_id: i64,
    ) -> Result<Vec<Self>, DbError> {
        let query = format!(
            r"
            SELECT {WAREHOUSE_COLUMNS}
            FROM warehouses
            WHERE warehouse_id = $1
               OR warehouse_name = $2
               OR warehouse_rezon_id = $3
               OR warehouse_metazon_id = $4
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .bind(warehouse_id)
            .bind(name)
            .bind(rezon_id)
            .bind(metazon_id)
            .fetch_all(pool)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// Whether any *other* live warehouse already uses this name.
    pub async fn is_name_taken(
        pool: &PgPool,
        warehouse_id: WarehouseId,
        name: &str,
    ) -> Result<bool, DbError> {
        let result: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(
                SELECT 1 FROM warehouses
                WHERE warehouse_id != $1 AND warehouse_name = $2
            )
            ",
        )
        .bind(warehouse_id)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(result.0)
    }

    /// Addresses of all *other* warehouses sharing the GLN.
    pub async fn addresses_for_gln(
        pool: &PgPool,
        warehouse_id: WarehouseId,
        gln: &str,
    ) -> Result<Vec<(WarehouseId, String)>, DbError> {
        sqlx::query_as(
            r"
            SELECT warehouse_id, warehouse_address
            FROM warehouses
            WHERE warehouse_id != $1
              AND warehouse_gln = $2
            ",
        )
        .bind(warehouse_id)
        .bind(gln)
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }

    /// Lock and return the next warehouse pending synchronization.
    ///
    /// Smallest id first; rows locked by concurrent claimants are skipped,
    /// not waited on. The row lock lives as long as the transaction, which
    /// is the whole claim mechanism: no claimed flag is persisted.
    pub async fn claim_next_in_tx(
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Option<Self>, DbError> {
        let query = format!(
            r"
            SELECT {WAREHOUSE_COLUMNS}
            FROM warehouses
            WHERE warehouse_is_synchronized = FALSE
            ORDER BY warehouse_id ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "
        );

        sqlx::query_as::<_, Self>(&query)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::QueryFailed)
    }

    /// Record a successful push to the external system.
    ///
    /// Stamps `synchronized_at` and merges the externally assigned identity
    /// with COALESCE, so a push that returned no identity does not erase a
    /// previously known one.
    pub async fn mark_synchronized_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: WarehouseId,
        goodzon_id: Option<i64>,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"
            UPDATE warehouses
            SET warehouse_is_synchronized = TRUE,
                warehouse_synchronized_at = CURRENT_TIMESTAMP,
                warehouse_goodzon_id = COALESCE($2, warehouse_goodzon_id)
            WHERE warehouse_id = $1
            ",
        )
        .bind(id)
        .bind(goodzon_id)
        .execute(&mut **tx)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(())
    }

    /// Flag a warehouse as needing synchronization. Idempotent;
    /// `synchronized_at` keeps its prior value so the state becomes
    /// `Outdated` rather than `Never` for previously synced rows.
    pub async fn mark_needs_sync(pool: &PgPool, id: WarehouseId) -> Result<(), DbError> {
        sqlx::query(
            r"
            UPDATE warehouses
            SET warehouse_is_synchronized = FALSE
            WHERE warehouse_id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(())
    }

    /// Transactional variant of [`Warehouse::mark_needs_sync`], used when the
    /// flip must commit together with the update that caused it.
    pub async fn mark_needs_sync_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: WarehouseId,
    ) -> Result<(), DbError> {
        sqlx::query(
            r"
            UPDATE warehouses
            SET warehouse_is_synchronized = FALSE
            WHERE warehouse_id = $1
            ",
        )
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(())
    }

    /// Flag every warehouse prioritized for the region as needing
    /// synchronization. Used by the priority re-sync cascade; runs in the
    /// caller's transaction so it commits with the region update that
    /// triggered it.
    pub async fn mark_needs_sync_for_region_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        region_id: RegionId,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"
            UPDATE warehouses
            SET warehouse_is_synchronized = FALSE
            WHERE warehouse_id IN (
                SELECT warehouse_id
                FROM warehouse_priorities
                WHERE region_id = $1
            )
            ",
        )
        .bind(region_id)
        .execute(&mut **tx)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(result.rows_affected())
    }

    /// Flag a batch of warehouses as needing synchronization.
    pub async fn mark_needs_sync_many(
        pool: &PgPool,
        ids: &[WarehouseId],
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"
            UPDATE warehouses
            SET warehouse_is_synchronized = FALSE
            WHERE warehouse_id = ANY($1)
            ",
        )
        .bind(ids)
        .execute(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(result.rows_affected())
    }

    /// Number of warehouses pending synchronization. Observability only.
    pub async fn count_pending_sync(pool: &PgPool) -> Result<i64, DbError> {
        let result: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM warehouses WHERE warehouse_is_synchronized = FALSE
            ",
        )
        .fetch_one(pool)
        .await
        .map_err(DbError::QueryFailed)?;

        Ok(result.0)
    }

    /// Per-warehouse sale regions derived from priority rows. A region is
    /// served when a priority row names it directly or names its parent.
    pub async fn sale_regions(pool: &PgPool) -> Result<Vec<WarehouseSaleRegions>, DbError> {
        sqlx::query_as(
            r"
            WITH selection AS (
                SELECT p.warehouse_id,
                       r.region_id
                FROM warehouse_priorities p
                         JOIN regions r ON p.region_id = r.region_parent_id
                                           OR p.region_id = r.region_id
            )
            SELECT warehouse_id,
                   array_agg(region_id) AS region_ids
            FROM selection
            GROUP BY warehouse_id
            ORDER BY warehouse_id
            ",
        )
        .fetch_all(pool)
        .await
        .map_err(DbError::QueryFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warehouse(is_synchronized: bool, synchronized_at: Option<DateTime<Utc>>) -> Warehouse {
        Warehouse {
            warehouse_id: WarehouseId::new(1),
            name: "Tver hub".to_string(),
            rezon_id: 10,
            metazon_id: 100,
            address: "Industrialnaya st. 7".to_string(),
            gln: None,
            type_id: WarehouseTypeId::new(1),
            characteristics: Json(WarehouseCharacteristics::default()),
            goodzon_id: None,
            new_type: false,
            assignment: None,
            management_system: None,
            created_by: "import".to_string(),
            is_synchronized,
            synchronized_at,
        }
    }

    #[test]
    fn test_sync_state_never() {
        assert_eq!(SyncState::from_columns(false, None), SyncState::Never);
    }

    #[test]
    fn test_sync_state_outdated() {
        assert_eq!(
            SyncState::from_columns(false, Some(Utc::now())),
            SyncState::Outdated
        );
    }

    #[test]
    fn test_sync_state_synced_regardless_of_timestamp() {
        assert_eq!(SyncState::from_columns(true, None), SyncState::Synced);
        assert_eq!(
            SyncState::from_columns(true, Some(Utc::now())),
            SyncState::Synced
        );
    }

    #[test]
    fn test_warehouse_sync_state_uses_columns() {
        assert_eq!(warehouse(false, None).sync_state(), SyncState::Never);
        assert_eq!(
            warehouse(false, Some(Utc::now())).sync_state(),
            SyncState::Outdated
        );
        assert_eq!(warehouse(true, Some(Utc::now())).sync_state(), SyncState::Synced);
    }

    #[test]
    fn test_characteristics_serde_shape() {
        let characteristics = WarehouseCharacteristics {
            barcode_only: true,
            uses_wms: false,
            is_transit: false,
            is_refund: true,
            auto_replenishment: false,
            closed: false,
        };

        let json = serde_json::to_value(characteristics).unwrap();
        assert_eq!(json["barcode_only"], true);
        assert_eq!(json["is_refund"], true);
        assert_eq!(json["uses_wms"], false);

        let back: WarehouseCharacteristics = serde_json::from_value(json).unwrap();
        assert_eq!(back, characteristics);
    }

    #[test]
    fn test_filter_default_is_unfiltered() {
        let filter = WarehouseFilter::default();
        assert!(filter.warehouse_ids.is_empty());
        assert!(filter.type_ids.is_empty());
        assert!(filter.search_name.is_none());
    }

    #[test]
    fn test_filter_constructors() {
        let by_ids = WarehouseFilter::by_ids(vec![WarehouseId::new(3)]);
        assert_eq!(by_ids.warehouse_ids, vec![WarehouseId::new(3)]);
        assert!(by_ids.type_ids.is_empty());

        let by_types = WarehouseFilter::by_types(vec![WarehouseTypeId::new(2)]);
        assert_eq!(by_types.type_ids, vec![WarehouseTypeId::new(2)]);
        assert!(by_types.warehouse_ids.is_empty());
    }
}
