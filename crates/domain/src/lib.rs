//! `eco-domain` — configuration and shared types for the EcoSim engine client.
//!
//! The canonical config definitions live here so that the CLI and the
//! engine client agree on one TOML schema without depending on each other.

pub mod config;
pub mod error;

pub use error::{Error, Result};
