//! Request shapes consumed by the services.
//!
//! These mirror the RPC surface one to one; the transport layer maps its
//! messages onto them without further interpretation.

use serde::{Deserialize, Serialize};

use whnet_core::{ClusterId, RegionId, WarehouseId, WarehouseTypeId};
use whnet_db::WarehouseCharacteristics;

/// Caller-settable characteristic flags.
///
/// `auto_replenishment` and `closed` are deliberately absent: they are not
/// settable through the master-data update path and always keep their stored
/// values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacteristicsPatch {
    #[serde(default)]
    pub barcode_only: bool,
    #[serde(default)]
    pub uses_wms: bool,
    #[serde(default)]
    pub is_transit: bool,
    #[serde(default)]
    pub is_refund: bool,
}

impl CharacteristicsPatch {
    /// Merge the patch onto stored characteristics, preserving the two
    /// operator-managed flags.
    #[must_use]
    pub fn apply(&self, stored: &WarehouseCharacteristics) -> WarehouseCharacteristics {
        WarehouseCharacteristics {
            barcode_only: self.barcode_only,
            uses_wms: self.uses_wms,
            is_transit: self.is_transit,
            is_refund: self.is_refund,
            auto_replenishment: stored.auto_replenishment,
            closed: stored.closed,
        }
    }

    /// Characteristics of a brand-new warehouse: patch flags plus the
    /// operator-managed flags at their defaults.
    #[must_use]
    pub fn into_new(self) -> WarehouseCharacteristics {
        self.apply(&WarehouseCharacteristics::default())
    }
}

/// Create a warehouse, optionally assigning an initial home region in the
/// same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWarehouseRequest {
    pub warehouse_id: WarehouseId,
    pub name: String,
    pub rezon_id: i64,
    pub metazon_id: i64,
    pub address: String,
    #[serde(default)]
    pub gln: Option<String>,
    pub type_id: WarehouseTypeId,
    #[serde(default)]
    pub characteristics: CharacteristicsPatch,
    #[serde(default)]
    pub management_system: Option<String>,
    #[serde(default)]
    pub assignment: Option<String>,
    #[serde(default)]
    pub new_type: bool,
    /// Initial home region for the warehouse, if any.
    #[serde(default)]
    pub region_id: Option<RegionId>,
}

/// Partial warehouse update. Omitted scalar fields keep stored values; a
/// blank GLN keeps the stored GLN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWarehouseRequest {
    pub warehouse_id: WarehouseId,
    #[serde(default)]
    pub name: Option<String>,
    pub address: String,
    #[serde(default)]
    pub gln: Option<String>,
    #[serde(default)]
    pub type_id: Option<WarehouseTypeId>,
    #[serde(default)]
    pub characteristics: CharacteristicsPatch,
    /// Home region to (re)assign alongside the update, if any.
    #[serde(default)]
    pub region_id: Option<RegionId>,
}

/// Create a region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegionRequest {
    pub region_id: RegionId,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<RegionId>,
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub update_priorities_enabled: bool,
}

/// The full set of updatable region values; which of them take effect is
/// governed by the accompanying mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionPatch {
    pub region_id: RegionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<RegionId>,
    #[serde(default)]
    pub cluster_id: ClusterId,
    #[serde(default)]
    pub update_priorities_enabled: bool,
}

/// Partial region update driven by an explicit field mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRegionRequest {
    pub region: RegionPatch,
    /// Wire paths of the fields to modify; unknown paths are rejected.
    pub update_mask: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristics_patch_preserves_operator_flags() {
        let stored = WarehouseCharacteristics {
            barcode_only: false,
            uses_wms: true,
            is_transit: false,
            is_refund: false,
            auto_replenishment: true,
            closed: true,
        };

        let patch = CharacteristicsPatch {
            barcode_only: true,
            uses_wms: false,
            is_transit: true,
            is_refund: true,
        };

        let merged = patch.apply(&stored);
        assert!(merged.barcode_only);
        assert!(!merged.uses_wms);
        assert!(merged.is_transit);
        assert!(merged.is_refund);
        // Not caller-settable through this path.
        assert!(merged.auto_replenishment);
        assert!(merged.closed);
    }

    #[test]
    fn test_new_warehouse_characteristics_default_operator_flags() {
        let patch = CharacteristicsPatch {
            barcode_only: true,
            ..CharacteristicsPatch::default()
        };

        let fresh = patch.into_new();
        assert!(fresh.barcode_only);
        assert!(!fresh.auto_replenishment);
        assert!(!fresh.closed);
    }

    #[test]
    fn test_create_request_minimal_json() {
        let json = r#"{
            "warehouse_id": 1,
            "name": "Tver hub",
            "rezon_id": 10,
            "metazon_id": 100,
            "address": "Industrialnaya st. 7",
            "type_id": 1
        }"#;

        let request: CreateWarehouseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.warehouse_id, WarehouseId::new(1));
        assert!(request.gln.is_none());
        assert!(request.region_id.is_none());
        assert_eq!(request.characteristics, CharacteristicsPatch::default());
        assert!(!request.new_type);
    }

    #[test]
    fn test_update_region_request_json() {
        let json = r#"{
            "region": {
                "region_id": 5,
                "title": "North-West",
                "cluster_id": 2
            },
            "update_mask": ["title"]
        }"#;

        let request: UpdateRegionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.region.region_id, RegionId::new(5));
        assert_eq!(request.update_mask, vec!["title".to_string()]);
        assert_eq!(request.region.name, "");
    }
}
