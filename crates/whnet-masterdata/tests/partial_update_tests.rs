//! Partial-update semantics exercised through the public API, without a
//! database: mask fidelity, fallback merging, and the resync decision.

use chrono::Utc;
use sqlx::types::Json;

use whnet_core::{ClusterId, RegionId, WarehouseId, WarehouseTypeId};
use whnet_db::{Region, Warehouse, WarehouseCharacteristics};
use whnet_masterdata::services::region_service::merge_region;
use whnet_masterdata::services::warehouse_service::{merge_warehouse, needs_resync};
use whnet_masterdata::{
    CharacteristicsPatch, RegionFieldMask, RegionPatch, UpdateRegionRequest,
    UpdateWarehouseRequest,
};

fn stored_region() -> Region {
    Region {
        region_id: RegionId::new(5),
        name: "north-west".to_string(),
        title: "North-West".to_string(),
        parent_id: None,
        cluster_id: ClusterId::new(2),
        update_priorities_enabled: false,
        edited_by: "ops".to_string(),
        updated: Utc::now(),
    }
}

fn stored_warehouse() -> Warehouse {
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
        is_synchronized: true,
        synchronized_at: Some(Utc::now()),
    }
}

#[test]
fn mask_with_title_only_leaves_name_untouched() {
    // The request alters both name and title but masks only title.
    let request: UpdateRegionRequest = serde_json::from_str(
        r#"{
            "region": {
                "region_id": 5,
                "name": "renamed",
                "title": "Retitled",
                "cluster_id": 2
            },
            "update_mask": ["title"]
        }"#,
    )
    .unwrap();

    let mask = RegionFieldMask::from_paths(&request.update_mask).unwrap();
    let merged = merge_region(&stored_region(), &request.region, &mask, "editor", Utc::now());

    assert_eq!(merged.name, "north-west");
    assert_eq!(merged.title, "Retitled");
}

#[test]
fn unmasked_zero_values_do_not_overwrite() {
    // A payload that omitted cluster_id deserializes to 0; the mask keeps
    // the stored value anyway.
    let patch = RegionPatch {
        region_id: RegionId::new(5),
        name: String::new(),
        title: String::new(),
        parent_id: None,
        cluster_id: ClusterId::new(0),
        update_priorities_enabled: false,
    };
    let mask = RegionFieldMask::from_paths(["title"]).unwrap();

    let merged = merge_region(&stored_region(), &patch, &mask, "editor", Utc::now());

    assert_eq!(merged.cluster_id, ClusterId::new(2));
    assert_eq!(merged.parent_id, None);
    assert_eq!(merged.name, "north-west");
    // Masked title was genuinely set to empty; the store-level blank guard
    // is what keeps it, not the merge.
    assert_eq!(merged.title, "");
}

#[test]
fn invalid_mask_path_is_rejected() {
    let err = RegionFieldMask::from_paths(["title", "region_updated"]).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("region_updated"));
}

#[test]
fn metadata_only_update_does_not_resync() {
    let stored = stored_warehouse();
    let request = UpdateWarehouseRequest {
        warehouse_id: stored.warehouse_id,
        name: None,
        address: stored.address.clone(),
        gln: None,
        type_id: None,
        characteristics: CharacteristicsPatch::default(),
        region_id: None,
    };

    let merged = merge_warehouse(&stored, &request);
    assert!(!needs_resync(&merged, &stored));
}

#[test]
fn each_tracked_field_triggers_resync() {
    let stored = stored_warehouse();
    let base = UpdateWarehouseRequest {
        warehouse_id: stored.warehouse_id,
        name: None,
        address: stored.address.clone(),
        gln: None,
        type_id: None,
        characteristics: CharacteristicsPatch::default(),
        region_id: None,
    };

    let cases: Vec<(&str, UpdateWarehouseRequest)> = vec![
        (
            "name",
            UpdateWarehouseRequest {
                name: Some("Tver hub north".to_string()),
                ..base.clone()
            },
        ),
        (
            "type",
            UpdateWarehouseRequest {
                type_id: Some(WarehouseTypeId::new(4)),
                ..base.clone()
            },
        ),
        (
            "gln",
            UpdateWarehouseRequest {
                gln: Some("4601234567892".to_string()),
                ..base.clone()
            },
        ),
        (
            "address",
            UpdateWarehouseRequest {
                address: "Zavodskaya st. 1".to_string(),
                ..base.clone()
            },
        ),
        (
            "characteristics",
            UpdateWarehouseRequest {
                characteristics: CharacteristicsPatch {
                    is_refund: true,
                    ..CharacteristicsPatch::default()
                },
                ..base.clone()
            },
        ),
    ];

    for (field, request) in cases {
        let merged = merge_warehouse(&stored, &request);
        assert!(
            needs_resync(&merged, &stored),
            "changing {field} must trigger resynchronization"
        );
    }
}

#[test]
fn address_renormalization_alone_is_not_a_change() {
    let stored = stored_warehouse();
    let request = UpdateWarehouseRequest {
        warehouse_id: stored.warehouse_id,
        name: None,
        address: "  Industrialnaya    st. 7 ".to_string(),
        gln: None,
        type_id: None,
        characteristics: CharacteristicsPatch::default(),
        region_id: None,
    };

    let merged = merge_warehouse(&stored, &request);
    assert_eq!(merged.address, stored.address);
    assert!(!needs_resync(&merged, &stored));
}
