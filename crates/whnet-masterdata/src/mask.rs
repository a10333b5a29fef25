//! Field mask for partial region updates.
//!
//! A mask is an explicit set of field paths the caller intends to modify.
//! Fields outside the mask keep their stored values no matter what the
//! request payload carries, which guards against accidental overwrites with
//! zero values.

use std::collections::BTreeSet;

use crate::error::MasterDataError;

/// Region fields addressable through the update mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegionField {
    Name,
    Title,
    ParentId,
    ClusterId,
    UpdatePrioritiesEnabled,
}

impl RegionField {
    /// The wire path of the field.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            RegionField::Name => "name",
            RegionField::Title => "title",
            RegionField::ParentId => "parent_id",
            RegionField::ClusterId => "cluster_id",
            RegionField::UpdatePrioritiesEnabled => "update_priorities_enabled",
        }
    }

    /// Resolve a wire path.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "name" => Some(RegionField::Name),
            "title" => Some(RegionField::Title),
            "parent_id" => Some(RegionField::ParentId),
            "cluster_id" => Some(RegionField::ClusterId),
            "update_priorities_enabled" => Some(RegionField::UpdatePrioritiesEnabled),
            _ => None,
        }
    }
}

/// Validated set of region fields a caller intends to modify.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionFieldMask(BTreeSet<RegionField>);

impl RegionFieldMask {
    /// Build a mask from explicit fields.
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = RegionField>) -> Self {
        Self(fields.into_iter().collect())
    }

    /// Mask covering every updatable field.
    #[must_use]
    pub fn all() -> Self {
        Self::new([
            RegionField::Name,
            RegionField::Title,
            RegionField::ParentId,
            RegionField::ClusterId,
            RegionField::UpdatePrioritiesEnabled,
        ])
    }

    /// Parse wire paths, rejecting unknown ones.
    ///
    /// # Errors
    ///
    /// Returns `MasterDataError::Validation` naming the first unknown path.
    pub fn from_paths<I, S>(paths: I) -> Result<Self, MasterDataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields = BTreeSet::new();
        for path in paths {
            let path = path.as_ref();
            let field = RegionField::from_path(path).ok_or_else(|| {
                MasterDataError::validation(format!("Invalid update_mask path: {path}"))
            })?;
            fields.insert(field);
        }
        Ok(Self(fields))
    }

    /// Whether the caller asked to modify this field.
    #[must_use]
    pub fn contains(&self, field: RegionField) -> bool {
        self.0.contains(&field)
    }

    /// Whether the mask names no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_roundtrip() {
        for field in [
            RegionField::Name,
            RegionField::Title,
            RegionField::ParentId,
            RegionField::ClusterId,
            RegionField::UpdatePrioritiesEnabled,
        ] {
            assert_eq!(RegionField::from_path(field.path()), Some(field));
        }
    }

    #[test]
    fn test_from_paths_accepts_known() {
        let mask = RegionFieldMask::from_paths(["title", "cluster_id"]).unwrap();
        assert!(mask.contains(RegionField::Title));
        assert!(mask.contains(RegionField::ClusterId));
        assert!(!mask.contains(RegionField::Name));
    }

    #[test]
    fn test_from_paths_rejects_unknown() {
        let err = RegionFieldMask::from_paths(["title", "edited_by"]).unwrap_err();
        assert!(err.to_string().contains("edited_by"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let mask = RegionFieldMask::from_paths(["name", "name"]).unwrap();
        assert_eq!(mask, RegionFieldMask::new([RegionField::Name]));
    }

    #[test]
    fn test_empty_mask() {
        let mask = RegionFieldMask::from_paths(Vec::<&str>::new()).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn test_all_covers_every_field() {
        let mask = RegionFieldMask::all();
        assert!(mask.contains(RegionField::Name));
        assert!(mask.contains(RegionField::UpdatePrioritiesEnabled));
    }
}
