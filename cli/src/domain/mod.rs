//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod connection;
pub mod error;
pub mod inventory;
pub mod known_hosts;
pub mod play;
pub mod trust;

pub use config::{ProvisionManifest, SshSettings};
pub use connection::{ConnectionDescriptor, Endpoint, Protocol};
pub use error::ProvisionError;
pub use play::{ApplyParams, BastionParams, PlaybookPlay};
pub use trust::{TrustPlan, TrustPolicy};
