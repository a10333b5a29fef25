//! Region management service.
//!
//! Region updates are mask-driven partial updates: the caller names the
//! fields it intends to modify and everything else keeps its stored value.
//! Enabling priority updates cascades into the priority collaborator within
//! the same transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use whnet_core::{ClusterId, RegionId, WarehouseId};
use whnet_db::{Region, RegionHomeWarehouse};

use crate::error::MasterDataError;
use crate::gateway::PriorityGateway;
use crate::mask::{RegionField, RegionFieldMask};
use crate::models::{CreateRegionRequest, RegionPatch, UpdateRegionRequest};

/// Merge a masked change-set onto the stored region.
///
/// Fields outside the mask keep their stored values regardless of what the
/// patch carries. The actor and timestamp are always stamped.
#[must_use]
pub fn merge_region(
    stored: &Region,
    patch: &RegionPatch,
    mask: &RegionFieldMask,
    edited_by: &str,
    updated: DateTime<Utc>,
) -> Region {
    Region {
        region_id: stored.region_id,
        name: if mask.contains(RegionField::Name) {
            patch.name.clone()
        } else {
            stored.name.clone()
        },
        title: if mask.contains(RegionField::Title) {
            patch.title.clone()
        } else {
            stored.title.clone()
        },
        parent_id: if mask.contains(RegionField::ParentId) {
            patch.parent_id
        } else {
            stored.parent_id
        },
        cluster_id: if mask.contains(RegionField::ClusterId) {
            patch.cluster_id
        } else {
            stored.cluster_id
        },
        update_priorities_enabled: if mask.contains(RegionField::UpdatePrioritiesEnabled) {
            patch.update_priorities_enabled
        } else {
            stored.update_priorities_enabled
        },
        edited_by: edited_by.to_string(),
        updated,
    }
}

/// Service for region master-data operations.
#[derive(Clone)]
pub struct RegionService {
    pool: PgPool,
    priorities: Arc<dyn PriorityGateway>,
}

impl RegionService {
    /// Create a new region service.
    #[must_use]
    pub fn new(pool: PgPool, priorities: Arc<dyn PriorityGateway>) -> Self {
        Self { pool, priorities }
    }

    /// Create a region.
    ///
    /// # Errors
    ///
    /// `Validation` when name or title is empty; `Database` on store
    /// failure.
    pub async fn create_region(
        &self,
        request: &CreateRegionRequest,
        actor: &str,
    ) -> Result<(), MasterDataError> {
        if request.name.is_empty() || request.title.is_empty() {
            return Err(MasterDataError::validation(
                "Region name and title have to be filled.",
            ));
        }

        let region = Region {
            region_id: request.region_id,
            name: request.name.clone(),
            title: request.title.clone(),
            parent_id: request.parent_id,
            cluster_id: request.cluster_id,
            update_priorities_enabled: request.update_priorities_enabled,
            edited_by: actor.to_string(),
            updated: Utc::now(),
        };

        Region::create(&self.pool, &region).await?;

        tracing::info!(region_id = %request.region_id, actor = %actor, "Region created");

        Ok(())
    }

    /// Apply a masked partial update to a region.
    ///
    /// When the merge flips `update_priorities_enabled` from off to on, the
    /// priority re-sync cascade runs inside the same transaction; its
    /// failure aborts the whole update.
    ///
    /// # Errors
    ///
    /// `Validation` for an invalid mask path; `NotFound` when the region
    /// does not exist; `Database` on store failure.
    pub async fn update_region(
        &self,
        request: &UpdateRegionRequest,
        actor: &str,
    ) -> Result<Region, MasterDataError> {
        let mask = RegionFieldMask::from_paths(&request.update_mask)?;

        let stored = Region::find_required(&self.pool, request.region.region_id).await?;

        let merged = merge_region(&stored, &request.region, &mask, actor, Utc::now());

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let committed = Region::update_in_tx(&mut tx, &merged)
            .await?
            .ok_or_else(|| {
                MasterDataError::NotFound(format!("region with id {}", request.region.region_id))
            })?;

        let priorities_enabled =
            merged.update_priorities_enabled && !stored.update_priorities_enabled;
        if priorities_enabled {
            self.priorities
                .sync_region_priorities(&mut tx, committed.region_id, actor)
                .await?;
        }

        tx.commit().await.map_err(map_sqlx)?;

        tracing::info!(
            region_id = %committed.region_id,
            actor = %actor,
            priorities_enabled,
            "Region updated"
        );

        Ok(committed)
    }

    /// Delete regions by id, snapshotting each into history. Absent ids are
    /// silently skipped.
    pub async fn delete_regions(&self, region_ids: &[RegionId]) -> Result<u64, MasterDataError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let removed = Region::delete_in_tx(&mut tx, region_ids).await?;
        tx.commit().await.map_err(map_sqlx)?;

        tracing::info!(requested = region_ids.len(), removed, "Regions deleted");

        Ok(removed)
    }

    /// List regions by id set (empty = all), ordered by id.
    pub async fn list_regions(&self, region_ids: &[RegionId]) -> Result<Vec<Region>, MasterDataError> {
        Ok(Region::list(&self.pool, region_ids).await?)
    }

    /// List regions by cluster set (empty = all), ordered by id.
    pub async fn list_regions_by_cluster(
        &self,
        cluster_ids: &[ClusterId],
    ) -> Result<Vec<Region>, MasterDataError> {
        Ok(Region::list_by_cluster(&self.pool, cluster_ids).await?)
    }

    /// List regions whose home warehouse is in the given set (empty = all),
    /// ordered by title.
    pub async fn list_regions_by_warehouse(
        &self,
        warehouse_ids: &[WarehouseId],
    ) -> Result<Vec<Region>, MasterDataError> {
        Ok(Region::list_by_home_warehouse(&self.pool, warehouse_ids).await?)
    }

    /// Current home-warehouse assignments for a region set (empty = all).
    pub async fn list_home_warehouses(
        &self,
        region_ids: &[RegionId],
    ) -> Result<Vec<RegionHomeWarehouse>, MasterDataError> {
        Ok(RegionHomeWarehouse::list(&self.pool, region_ids).await?)
    }
}

fn map_sqlx(err: sqlx::Error) -> MasterDataError {
    MasterDataError::Database(whnet_db::DbError::QueryFailed(err))
}
