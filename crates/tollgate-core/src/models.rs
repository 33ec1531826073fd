//! Domain models for Tollgate.
//!
//! These are the core types shared across all crates.

pub mod consent;
pub mod grant;
pub mod organization;
pub mod permission;
pub mod role;
pub mod scope;
pub mod service;
