//! In-memory host registry (no persistence)

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::HostRegistry;
use super::error::{RegistryError, RegistryResult};
use crate::HostRecord;

#[derive(Default)]
pub struct MemoryRegistry {
    hosts: RwLock<Vec<HostRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with `hosts`
    ///
    /// Later records with an already seen address are dropped.
    pub fn with_hosts(hosts: impl IntoIterator<Item = HostRecord>) -> Self {
        let mut unique: Vec<HostRecord> = Vec::new();
        for host in hosts {
            if unique.iter().any(|known| known.address == host.address) {
                debug!("dropping duplicate seed record for {}", host.address);
                continue;
            }
            unique.push(host);
        }

        Self {
            hosts: RwLock::new(unique),
        }
    }

    pub async fn len(&self) -> usize {
        self.hosts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.hosts.read().await.is_empty()
    }
}

#[async_trait]
impl HostRegistry for MemoryRegistry {
    async fn list_hosts(&self) -> RegistryResult<Vec<HostRecord>> {
        Ok(self.hosts.read().await.clone())
    }

    async fn add_host(&self, record: HostRecord) -> RegistryResult<()> {
        let mut hosts = self.hosts.write().await;

        if hosts.iter().any(|host| host.address == record.address) {
            return Err(RegistryError::DuplicateAddress(record.address));
        }

        debug!("registered host {}", record.address);
        hosts.push(record);

        Ok(())
    }

    async fn remove_host(&self, address: &str) -> RegistryResult<()> {
        let mut hosts = self.hosts.write().await;

        let Some(idx) = hosts.iter().position(|host| host.address == address) else {
            return Err(RegistryError::NotFound(address.to_string()));
        };

        hosts.remove(idx);
        debug!("removed host {address}");

        Ok(())
    }
}
