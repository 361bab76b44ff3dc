//! Error types for registry operations

use std::fmt;

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A host with this address is already registered
    DuplicateAddress(String),

    /// No host with this address is registered
    NotFound(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateAddress(address) => {
                write!(f, "host {} is already registered", address)
            }
            RegistryError::NotFound(address) => write!(f, "host {} is not registered", address),
        }
    }
}

impl std::error::Error for RegistryError {}
