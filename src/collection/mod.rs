//! Metric collection
//!
//! ## Pieces
//!
//! - **parsers**: pure functions turning command output into numbers
//! - **synthetic**: deterministic placeholder data per host
//! - **outcome**: the real-vs-synthetic policy as plain functions
//! - **orchestrator**: the `Collector` fanning a cycle out across hosts

pub mod orchestrator;
pub mod outcome;
pub mod parsers;
pub mod synthetic;

pub use orchestrator::{Collector, CollectorSettings};
pub use outcome::{CollectError, CollectionMode, CollectionOutcome};
