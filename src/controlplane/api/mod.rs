//! API Module
//!
//! Provides the REST API for profile resolution and backend inspection.

pub mod rest;
pub mod server;

pub use rest::*;
pub use server::*;
