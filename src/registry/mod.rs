//! Host registry
//!
//! The registry owns the set of monitored hosts. Collection only ever reads
//! a snapshot of it via [`HostRegistry::list_hosts`], so edits made while a
//! cycle is running show up in the next cycle.
//!
//! ## Backends
//!
//! - **In-Memory**: [`MemoryRegistry`], lost on restart
//!
//! New hosts should go through [`register_host`], which validates and probes
//! before anything is stored.

pub mod backend;
pub mod error;
pub mod memory;
pub mod registration;

pub use backend::HostRegistry;
pub use error::{RegistryError, RegistryResult};
pub use memory::MemoryRegistry;
pub use registration::{NewHost, RegistrationError, register_host};
