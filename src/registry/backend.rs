//! Registry trait definition

use async_trait::async_trait;

use super::error::RegistryResult;
use crate::HostRecord;

/// Storage for the monitored host set
///
/// Addresses are unique. Implementations must be `Send + Sync`, the
/// collector reads the host list from inside async tasks.
#[async_trait]
pub trait HostRegistry: Send + Sync {
    /// Snapshot of all hosts in registration order
    async fn list_hosts(&self) -> RegistryResult<Vec<HostRecord>>;

    /// Add a host. Fails with `DuplicateAddress` and changes nothing if the
    /// address is taken.
    async fn add_host(&self, record: HostRecord) -> RegistryResult<()>;

    /// Remove the host with `address`
    async fn remove_host(&self, address: &str) -> RegistryResult<()>;

    async fn contains(&self, address: &str) -> RegistryResult<bool> {
        Ok(self
            .list_hosts()
            .await?
            .iter()
            .any(|host| host.address == address))
    }
}
