//! Domain layer - Profiles, capability tables and port definitions
//!
//! This module defines the core types and the adapter trait that backends
//! implement, following hexagonal architecture principles.

pub mod ports;
pub mod profile;
pub mod units;

pub use ports::*;
pub use profile::*;
