//! Contract with the external master-data system.

use async_trait::async_trait;

use whnet_db::Warehouse;

/// Push target for warehouse master data.
///
/// Implementations wrap whatever transport the external system speaks. The
/// runner treats any error as "leave the row pending"; it never retries a
/// push within the same claim.
#[async_trait]
pub trait MasterDataGateway: Send + Sync {
    /// Push the warehouse to the external system.
    ///
    /// Returns the identity the external system assigned, or `None` when it
    /// did not report one (an already-known identity is kept either way).
    async fn push(
        &self,
        warehouse: &Warehouse,
    ) -> Result<Option<i64>, Box<dyn std::error::Error + Send + Sync>>;
}
