//! Cadence Common Library
//!
//! Shared constants and configuration loading utilities for all Cadence
//! workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide limits and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod consts;
pub mod prelude;
