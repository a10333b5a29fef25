//! Pre-commit invariant checks.
//!
//! Everything here is a pure function over a candidate entity and whatever
//! slice of store state the caller already fetched; nothing in this module
//! touches the database.

use whnet_core::WarehouseId;
use whnet_db::Warehouse;

/// Collapse runs of whitespace to single spaces and trim the ends.
/// Addresses are stored in this form.
#[must_use]
pub fn collapse_spaces(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove all whitespace. Used for address comparison only, never storage.
#[must_use]
pub fn strip_spaces(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Whether two addresses refer to the same place: equal after whitespace
/// removal and case folding.
#[must_use]
pub fn addresses_match(left: &str, right: &str) -> bool {
    strip_spaces(left).to_lowercase() == strip_spaces(right).to_lowercase()
}

/// GLN format rule: exactly 13 ASCII digits.
#[must_use]
pub fn is_valid_gln(gln: &str) -> bool {
    gln.len() == 13 && gln.bytes().all(|b| b.is_ascii_digit())
}

/// First uniqueness violation between a candidate warehouse and the live
/// rows colliding with it, in key priority order: id, then name, then
/// RezonId, then MetazonId.
#[must_use]
pub fn duplicate_violation(
    warehouse_id: WarehouseId,
    name: &str,
    rezon_id: i64,
    metazon_id: i64,
    conflicting: &[Warehouse],
) -> Option<String> {
    if conflicting.iter().any(|w| w.warehouse_id == warehouse_id) {
        return Some(format!("A warehouse with id {warehouse_id} already exists."));
    }
    if conflicting.iter().any(|w| w.name == name) {
        return Some(format!("A warehouse with name \"{name}\" already exists."));
    }
    if conflicting.iter().any(|w| w.rezon_id == rezon_id) {
        return Some(format!("A warehouse with RezonId {rezon_id} already exists."));
    }
    if conflicting.iter().any(|w| w.metazon_id == metazon_id) {
        return Some(format!(
            "A warehouse with MetazonId {metazon_id} already exists."
        ));
    }
    None
}

/// GLN consistency: every other warehouse sharing the GLN must carry the
/// same address. Returns the violation message, if any.
#[must_use]
pub fn gln_violation(
    gln: &str,
    candidate_address: &str,
    shared_addresses: &[(WarehouseId, String)],
) -> Option<String> {
    if shared_addresses
        .iter()
        .all(|(_, address)| addresses_match(address, candidate_address))
    {
        None
    } else {
        Some(format!(
            "A warehouse with GLN {gln} already exists at a different address."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use whnet_core::WarehouseTypeId;
    use whnet_db::WarehouseCharacteristics;

    fn warehouse(id: i64, name: &str, rezon_id: i64, metazon_id: i64) -> Warehouse {
        Warehouse {
            warehouse_id: WarehouseId::new(id),
            name: name.to_string(),
            rezon_id,
            metazon_id,
            address: "Some address 1".to_string(),
            gln: None,
            type_id: WarehouseTypeId::new(1),
            characteristics: Json(WarehouseCharacteristics::default()),
            goodzon_id: None,
            new_type: false,
            assignment: None,
            management_system: None,
            created_by: "import".to_string(),
            is_synchronized: false,
            synchronized_at: None,
        }
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("  Lenina   st.  5 "), "Lenina st. 5");
        assert_eq!(collapse_spaces("one\ttwo\n three"), "one two three");
        assert_eq!(collapse_spaces(""), "");
    }

    #[test]
    fn test_addresses_match_ignores_spacing_and_case() {
        assert!(addresses_match("Lenina St. 5", "lenina st.5"));
        assert!(addresses_match(" LENINA ST. 5 ", "Lenina   St. 5"));
        assert!(!addresses_match("Lenina St. 5", "Lenina St. 6"));
    }

    #[test]
    fn test_gln_format() {
        assert!(is_valid_gln("4601234567892"));
        assert!(!is_valid_gln("460123456789"));
        assert!(!is_valid_gln("46012345678921"));
        assert!(!is_valid_gln("460123456789x"));
        assert!(!is_valid_gln(""));
    }

    #[test]
    fn test_duplicate_priority_order() {
        // One stored row colliding on every key: id wins.
        let stored = vec![warehouse(1, "A", 10, 100)];
        let message =
            duplicate_violation(WarehouseId::new(1), "A", 10, 100, &stored).unwrap();
        assert_eq!(message, "A warehouse with id 1 already exists.");

        // Same keys but different id: name wins over rezon/metazon.
        let message =
            duplicate_violation(WarehouseId::new(2), "A", 10, 100, &stored).unwrap();
        assert_eq!(message, "A warehouse with name \"A\" already exists.");

        let message =
            duplicate_violation(WarehouseId::new(2), "B", 10, 100, &stored).unwrap();
        assert_eq!(message, "A warehouse with RezonId 10 already exists.");

        let message =
            duplicate_violation(WarehouseId::new(2), "B", 20, 100, &stored).unwrap();
        assert_eq!(message, "A warehouse with MetazonId 100 already exists.");
    }

    #[test]
    fn test_no_duplicates_passes() {
        let stored = vec![warehouse(1, "A", 10, 100)];
        assert!(duplicate_violation(WarehouseId::new(2), "B", 20, 200, &stored).is_none());
        assert!(duplicate_violation(WarehouseId::new(2), "B", 20, 200, &[]).is_none());
    }

    #[test]
    fn test_gln_violation_requires_matching_addresses() {
        let shared = vec![
            (WarehouseId::new(2), "Lenina st. 5".to_string()),
            (WarehouseId::new(3), "LENINA ST.5".to_string()),
        ];

        assert!(gln_violation("4601234567892", "Lenina st. 5", &shared).is_none());

        let violation = gln_violation("4601234567892", "Kirova st. 1", &shared).unwrap();
        assert!(violation.contains("4601234567892"));
    }

    #[test]
    fn test_gln_violation_empty_set_passes() {
        assert!(gln_violation("4601234567892", "Anywhere 1", &[]).is_none());
    }
}
