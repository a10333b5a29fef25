//! Strongly Typed Identifiers
//!
//! Newtype wrappers around the numeric legacy identifiers used throughout
//! the warehouse network. Using distinct types prevents accidentally passing
//! a region id where a warehouse id is expected at compile time.
//!
//! # Example
//!
//! ```
//! use whnet_core::{RegionId, WarehouseId};
//!
//! let warehouse = WarehouseId::new(17);
//!
//! fn requires_warehouse(id: WarehouseId) -> String {
//!     id.to_string()
//! }
//!
//! let rendered = requires_warehouse(warehouse);
//! assert_eq!(rendered, "17");
//! // requires_warehouse(RegionId::new(17)); // does not compile
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error type for identifier parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of identifier that failed to parse.
    pub id_type: &'static str,
    /// The underlying integer parse error message.
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed numeric identifier.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw numeric identifier.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl Default for $name {
            /// Zero, the "unset" value of the wire format.
            fn default() -> Self {
                Self(0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<i64>().map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    message: e.to_string(),
                })
            }
        }
    };
}

define_id!(
    /// Strongly typed identifier for warehouses.
    ///
    /// This is the clearing identifier assigned when the warehouse is
    /// registered, not a surrogate key, so it is never generated locally.
    WarehouseId
);

define_id!(
    /// Strongly typed identifier for regions.
    RegionId
);

define_id!(
    /// Strongly typed identifier for region clusters.
    ClusterId
);

define_id!(
    /// Strongly typed identifier for entries of the warehouse type catalog.
    WarehouseTypeId
);
