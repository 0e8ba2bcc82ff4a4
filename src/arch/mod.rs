#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The architecture database and the configurations conditions are checked
//! against.

/// Hardware configurations.
pub mod config;
/// The database and name resolution.
pub mod database;
/// Extensions and extension requirements.
pub mod extension;
/// Parameters.
pub mod parameter;
/// Versions and version requirements.
pub mod version;
