//! Registering a new host
//!
//! ```text
//! NewHost ─► validate ─► probe ─► add_host ─► HostRecord
//!               │          │          │
//!            Invalid  ProbeRejected  Registry(DuplicateAddress)
//! ```
//!
//! Nothing is stored unless every step succeeds.

use std::fmt;

use tracing::{info, instrument, warn};

use super::{backend::HostRegistry, error::RegistryError};
use crate::{
    DEFAULT_SSH_PORT, HostRecord, Secret,
    probe::{ProbeFailure, Prober},
    remote::validate::{validate_address, validate_port, validate_username},
};

/// User input for a host that is about to be registered
#[derive(Debug, Clone, Default)]
pub struct NewHost {
    pub address: String,
    pub username: String,
    pub secret: Secret,
    pub port: Option<u16>,
    pub display_name: Option<String>,
    /// Register without probing and always use synthetic data
    pub simulated: bool,
}

impl NewHost {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            secret: Secret::new(secret),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("address is required".to_string());
        }
        if self.username.trim().is_empty() {
            return Err("username is required".to_string());
        }
        if !self.simulated && self.secret.is_blank() {
            return Err("secret is required".to_string());
        }

        validate_address(self.address.trim())?;
        validate_username(self.username.trim())?;
        validate_port(self.port.unwrap_or(DEFAULT_SSH_PORT))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// Required fields are missing or malformed
    Invalid(String),

    /// The connectivity probe failed
    ProbeRejected(ProbeFailure),

    /// The registry refused the record
    Registry(RegistryError),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Invalid(msg) => write!(f, "invalid host: {}", msg),
            RegistrationError::ProbeRejected(reason) => write!(f, "{}", reason),
            RegistrationError::Registry(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for RegistrationError {
    fn from(err: RegistryError) -> Self {
        RegistrationError::Registry(err)
    }
}

/// Validate, probe and store a new host
///
/// The display name is the user's choice, else what the host calls
/// itself, else its address.
#[instrument(skip_all, fields(address = %new_host.address))]
pub async fn register_host(
    registry: &dyn HostRegistry,
    prober: &Prober,
    new_host: NewHost,
) -> Result<HostRecord, RegistrationError> {
    new_host.validate().map_err(RegistrationError::Invalid)?;

    let address = new_host.address.trim().to_string();
    let username = new_host.username.trim().to_string();
    let port = new_host.port.unwrap_or(DEFAULT_SSH_PORT);

    let identifier = if new_host.simulated {
        None
    } else {
        let result = prober.probe(&address, &username, &new_host.secret, port).await;
        if let Some(reason) = result.failure_reason {
            warn!("probe rejected new host: {reason}");
            return Err(RegistrationError::ProbeRejected(reason));
        }
        result.remote_identifier
    };

    let display_name = new_host
        .display_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or(identifier)
        .unwrap_or_else(|| address.clone());

    let record = HostRecord {
        secret: new_host.secret,
        ..HostRecord::new(address, username, "")
    }
    .with_port(port)
    .with_display_name(display_name)
    .simulated(new_host.simulated);

    registry.add_host(record.clone()).await?;

    info!("host {} registered as {:?}", record.address, record.display_name);

    Ok(record)
}
