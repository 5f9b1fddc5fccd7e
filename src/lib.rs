//! Storage Profiles - Profile Resolution Engine
//!
//! Lets callers ask for a qualitative tier of storage (gold, silver,
//! bronze) and turns that request into the concrete parameters a specific
//! backend understands.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Resolution Engine                             │
//! │   VolumeRequest ──► Profile Registry ──► Capability Adapter         │
//! │                            │                    │                   │
//! │                            │          unsupported profile           │
//! │                            │                    ▼                   │
//! │                            │            Fallback Policy             │
//! │                            ▼                    │                   │
//! │                  ConcreteStorageParameters ◄────┘                   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                 Backend Registry (once-initialized)                 │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────────┐  ┌───────────────┐    │
//! │  │   EBS    │  │  Cinder  │  │   Mayastor   │  │   Loopback    │    │
//! │  └──────────┘  └──────────┘  └──────────────┘  └───────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: Resolution engine, backend adapters, registry and API
//! - [`domain`]: Profiles, capability tables and the adapter trait
//! - [`config`]: YAML configuration
//! - [`error`]: Error types and handling

pub mod config;
pub mod controlplane;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use config::ResolverConfig;

pub use controlplane::{
    ApiServer, ApiServerConfig, BackendEntry, BackendFactory, BackendRegistry,
    BackendRegistryBuilder, EngineConfig, ResolutionEngine, ResolutionMetrics,
};

pub use domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
    FallbackPolicy, ParameterSource, TierCapability, VolumeRequest, PROFILE_METADATA_KEY,
};

pub use domain::profile::{CostTier, PerformanceTier, Profile, ProfileRegistry, RequirementVector};

pub use error::{Error, ErrorAction, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
