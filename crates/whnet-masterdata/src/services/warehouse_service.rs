//! Warehouse management service.
//!
//! Owns the create/update flows: invariant checks against the current store
//! state, the partial-update merge, the needs-resync decision, and the
//! home-region assignment, all committed as one transaction per operation.

use std::sync::Arc;

use sqlx::types::Json;
use sqlx::PgPool;

use whnet_core::WarehouseId;
use whnet_db::models::warehouse_type::AUTO_REPLENISHMENT_TYPE_ID;
use whnet_db::{
    RegionHomeWarehouse, Warehouse, WarehouseFilter, WarehouseSaleRegions, WarehouseType,
};

use crate::error::MasterDataError;
use crate::gateway::PriorityGateway;
use crate::models::{CreateWarehouseRequest, UpdateWarehouseRequest};
use crate::validation::{
    collapse_spaces, duplicate_violation, gln_violation, is_valid_gln,
};

/// Merge a partial update onto the stored row.
///
/// Omitted name/type fall back to stored values, the address is
/// whitespace-normalized, a blank GLN keeps the stored GLN, and the
/// characteristics merge preserves the operator-managed flags. Everything
/// the update path cannot touch (legacy ids, goodzon id, tags, sync
/// columns) is carried over unchanged.
#[must_use]
pub fn merge_warehouse(stored: &Warehouse, request: &UpdateWarehouseRequest) -> Warehouse {
    let gln = match request.gln.as_deref().map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Some(trimmed.to_string()),
        _ => stored.gln.clone(),
    };

    Warehouse {
        warehouse_id: stored.warehouse_id,
        name: request.name.clone().unwrap_or_else(|| stored.name.clone()),
        rezon_id: stored.rezon_id,
        metazon_id: stored.metazon_id,
        address: collapse_spaces(&request.address),
        gln,
        type_id: request.type_id.unwrap_or(stored.type_id),
        characteristics: Json(request.characteristics.apply(&stored.characteristics)),
        goodzon_id: stored.goodzon_id,
        new_type: stored.new_type,
        assignment: stored.assignment.clone(),
        management_system: stored.management_system.clone(),
        created_by: stored.created_by.clone(),
        is_synchronized: stored.is_synchronized,
        synchronized_at: stored.synchronized_at,
    }
}

/// Whether the merged row differs from storage in a way the external
/// master-data system cares about: name, type, GLN, address, or
/// characteristics. Actor/timestamp-only changes do not count.
#[must_use]
pub fn needs_resync(merged: &Warehouse, stored: &Warehouse) -> bool {
    merged.name != stored.name
        || merged.type_id != stored.type_id
        || merged.gln != stored.gln
        || merged.address != stored.address
        || merged.characteristics.0 != stored.characteristics.0
}

/// Service for warehouse master-data operations.
#[derive(Clone)]
pub struct WarehouseService {
    pool: PgPool,
    priorities: Arc<dyn PriorityGateway>,
}

impl WarehouseService {
    /// Create a new warehouse service.
    #[must_use]
    pub fn new(pool: PgPool, priorities: Arc<dyn PriorityGateway>) -> Self {
        Self { pool, priorities }
    }

    /// Create a warehouse in state "never synchronized", optionally
    /// assigning its initial home region in the same transaction.
    ///
    /// # Errors
    ///
    /// `Validation` with the specific violated invariant (uniqueness in
    /// priority order id/name/RezonId/MetazonId, GLN format and address
    /// consistency, required fields, region-assignment compatibility);
    /// `Database` on store failure.
    pub async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
        actor: &str,
    ) -> Result<(), MasterDataError> {
        if request.name.trim().is_empty() {
            return Err(MasterDataError::validation(
                "Warehouse name must not be empty.",
            ));
        }
        if request.address.trim().is_empty() {
            return Err(MasterDataError::validation(
                "Warehouse address must not be empty.",
            ));
        }
        if !WarehouseType::exists(&self.pool, request.type_id).await? {
            return Err(MasterDataError::Validation(format!(
                "Unknown warehouse type id {}.",
                request.type_id
            )));
        }
        self.check_region_assignment(request.region_id.is_some(), request.type_id)?;

        let conflicting = Warehouse::find_conflicting(
            &self.pool,
            request.warehouse_id,
            &request.name,
            request.rezon_id,
            request.metazon_id,
        )
        .await?;
        if let Some(message) = duplicate_violation(
            request.warehouse_id,
            &request.name,
            request.rezon_id,
            request.metazon_id,
            &conflicting,
        ) {
            return Err(MasterDataError::Validation(message));
        }

        let gln = self
            .check_gln(request.warehouse_id, request.gln.as_deref(), &request.address)
            .await?;

        let warehouse = Warehouse {
            warehouse_id: request.warehouse_id,
            name: request.name.clone(),
            rezon_id: request.rezon_id,
            metazon_id: request.metazon_id,
            address: collapse_spaces(&request.address),
            gln,
            type_id: request.type_id,
            characteristics: Json(request.characteristics.into_new()),
            goodzon_id: None,
            new_type: request.new_type,
            assignment: request.assignment.clone(),
            management_system: request.management_system.clone(),
            created_by: actor.to_string(),
            is_synchronized: false,
            synchronized_at: None,
        };

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        Warehouse::create_in_tx(&mut tx, &warehouse, actor).await?;

        if let Some(region_id) = request.region_id {
            RegionHomeWarehouse::upsert_in_tx(
                &mut tx,
                &[(region_id, request.warehouse_id)],
                actor,
            )
            .await?;
        }

        tx.commit().await.map_err(map_sqlx)?;

        tracing::info!(
            warehouse_id = %request.warehouse_id,
            actor = %actor,
            "Warehouse created"
        );

        Ok(())
    }

    /// Apply a partial update to a warehouse.
    ///
    /// The merged row is written conditionally: identical values leave both
    /// the live table and history untouched. When a tracked field changed,
    /// the row is flipped to needing synchronization inside the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` when the warehouse does not exist; `Validation` for name
    /// duplication, blank address, GLN violations, forbidden type change, or
    /// incompatible region assignment; `Database` on store failure.
    pub async fn update_warehouse(
        &self,
        request: &UpdateWarehouseRequest,
        actor: &str,
    ) -> Result<(), MasterDataError> {
        if let Some(name) = request.name.as_deref() {
            if Warehouse::is_name_taken(&self.pool, request.warehouse_id, name).await? {
                return Err(MasterDataError::Validation(format!(
                    "A warehouse with name \"{name}\" already exists."
                )));
            }
        }
        if request.address.trim().is_empty() {
            return Err(MasterDataError::validation(
                "Warehouse address must not be empty.",
            ));
        }
        self.check_gln(request.warehouse_id, request.gln.as_deref(), &request.address)
            .await?;

        let stored = Warehouse::find_required(&self.pool, request.warehouse_id).await?;

        let target_type = request.type_id.unwrap_or(stored.type_id);
        if target_type != stored.type_id && !WarehouseType::exists(&self.pool, target_type).await? {
            return Err(MasterDataError::Validation(format!(
                "Unknown warehouse type id {target_type}."
            )));
        }
        self.check_region_assignment(request.region_id.is_some(), target_type)?;

        if target_type != stored.type_id {
            let priorities = self
                .priorities
                .list_priorities(&[], &[stored.warehouse_id])
                .await?;
            if !priorities.is_empty() {
                return Err(MasterDataError::validation(
                    "Cannot change the type of a warehouse that has region priorities.",
                ));
            }
        }

        let merged = merge_warehouse(&stored, request);
        let resync = needs_resync(&merged, &stored);

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        Warehouse::update_in_tx(&mut tx, &merged, actor).await?;

        if let Some(region_id) = request.region_id {
            RegionHomeWarehouse::upsert_in_tx(
                &mut tx,
                &[(region_id, request.warehouse_id)],
                actor,
            )
            .await?;
        }

        if resync {
            Warehouse::mark_needs_sync_in_tx(&mut tx, stored.warehouse_id).await?;
        }

        tx.commit().await.map_err(map_sqlx)?;

        tracing::info!(
            warehouse_id = %request.warehouse_id,
            actor = %actor,
            resync,
            "Warehouse updated"
        );

        Ok(())
    }

    /// List warehouses matching the filter, ordered by name.
    pub async fn list_warehouses(
        &self,
        filter: &WarehouseFilter,
    ) -> Result<Vec<Warehouse>, MasterDataError> {
        Ok(Warehouse::list(&self.pool, filter).await?)
    }

    /// List warehouses of the storage types.
    pub async fn list_storage_warehouses(&self) -> Result<Vec<Warehouse>, MasterDataError> {
        Ok(Warehouse::list_storage(&self.pool).await?)
    }

    /// List warehouses participating in automatic replenishment.
    pub async fn list_auto_replenishment_warehouses(
        &self,
    ) -> Result<Vec<Warehouse>, MasterDataError> {
        Ok(Warehouse::list(
            &self.pool,
            &WarehouseFilter::by_types(vec![AUTO_REPLENISHMENT_TYPE_ID]),
        )
        .await?)
    }

    /// The fixed warehouse type catalog.
    pub async fn list_warehouse_types(&self) -> Result<Vec<WarehouseType>, MasterDataError> {
        Ok(WarehouseType::list_all(&self.pool).await?)
    }

    /// Per-warehouse sale regions derived from priority rows.
    pub async fn list_sale_regions(&self) -> Result<Vec<WarehouseSaleRegions>, MasterDataError> {
        Ok(Warehouse::sale_regions(&self.pool).await?)
    }

    /// Home-region assignment is only available for storage warehouses.
    fn check_region_assignment(
        &self,
        has_region: bool,
        type_id: whnet_core::WarehouseTypeId,
    ) -> Result<(), MasterDataError> {
        if has_region && !WarehouseType::is_storage(type_id) {
            return Err(MasterDataError::validation(
                "A home region can only be assigned to a storage warehouse.",
            ));
        }
        Ok(())
    }

    /// Validate a GLN against format and cross-warehouse address
    /// consistency. Returns the trimmed GLN to store, or `None` when the
    /// request carried none.
    async fn check_gln(
        &self,
        warehouse_id: WarehouseId,
        gln: Option<&str>,
        address: &str,
    ) -> Result<Option<String>, MasterDataError> {
        let Some(gln) = gln.map(str::trim).filter(|g| !g.is_empty()) else {
            return Ok(None);
        };

        if !is_valid_gln(gln) {
            return Err(MasterDataError::Validation(format!(
                "GLN value {gln} is not valid."
            )));
        }

        let shared = Warehouse::addresses_for_gln(&self.pool, warehouse_id, gln).await?;
        if let Some(message) = gln_violation(gln, address, &shared) {
            return Err(MasterDataError::Validation(message));
        }

        Ok(Some(gln.to_string()))
    }
}

fn map_sqlx(err: sqlx::Error) -> MasterDataError {
    MasterDataError::Database(whnet_db::DbError::QueryFailed(err))
}
