//! iconsweep-core
//!
//! Core library for finding, auditing and consolidating icons in a design
//! document tree.
//!
//! This crate defines the node model, the tree mutation interface, the
//! analysis pipeline (classification, discovery, consistency checks,
//! similarity, clustering), the consolidation service and project database
//! integration. The CLI is a thin frontend over it.

pub mod analysis;
pub mod config;
pub mod db;
pub mod model;
pub mod services;
pub mod tree;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
