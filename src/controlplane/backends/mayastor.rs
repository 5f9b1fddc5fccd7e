//! Mayastor Capability Adapter
//!
//! Profiles select a disk pool by label and a replica count. Mayastor pools
//! come in two flavors, hot NVMe and cold capacity, so there is no silver
//! tier.

use super::tier_parameters;
use crate::domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
    TierCapability,
};
use crate::domain::profile::{PerformanceTier, Profile, RequirementVector};
use crate::domain::units::MIB;
use crate::error::Result;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Mayastor adapter
#[derive(Debug, Clone)]
pub struct MayastorConfig {
    /// Mayastor namespace
    pub namespace: String,
    /// Volume transport protocol
    pub protocol: String,
}

impl Default for MayastorConfig {
    fn default() -> Self {
        Self {
            namespace: "mayastor".to_string(),
            protocol: "nvmf".to_string(),
        }
    }
}

// =============================================================================
// Mayastor Adapter
// =============================================================================

/// Capability adapter for Mayastor block storage
#[derive(Debug)]
pub struct MayastorAdapter {
    name: String,
    config: MayastorConfig,
    capabilities: BackendCapabilitySet,
}

impl MayastorAdapter {
    /// Create an adapter with the built-in capability table
    pub fn new(name: impl Into<String>, config: MayastorConfig) -> Self {
        Self::with_capabilities(name, config, Self::builtin_capabilities())
    }

    /// Create an adapter with a custom capability table
    pub fn with_capabilities(
        name: impl Into<String>,
        config: MayastorConfig,
        capabilities: BackendCapabilitySet,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            capabilities,
        }
    }

    /// Built-in table; unlabeled volumes land on the hot pool
    pub fn builtin_capabilities() -> BackendCapabilitySet {
        let hot = TierCapability {
            replicas: Some(3),
            ..TierCapability::new("tier=hot", PerformanceTier::High)
        };
        let cold = TierCapability {
            replicas: Some(1),
            ..TierCapability::new("tier=cold", PerformanceTier::Low)
        };

        BackendCapabilitySet::unprofiled(hot.clone())
            .with_tier(Profile::Gold, hot)
            .with_tier(Profile::Bronze, cold)
    }

    fn decorate(&self, mut params: ConcreteStorageParameters) -> ConcreteStorageParameters {
        params
            .parameters
            .insert("poolSelector".to_string(), params.volume_class.clone());
        if let Some(replicas) = params.replicas {
            params
                .parameters
                .insert("repl".to_string(), replicas.to_string());
        }
        params
            .parameters
            .insert("namespace".to_string(), self.config.namespace.clone());
        params
            .parameters
            .insert("protocol".to_string(), self.config.protocol.clone());
        params
    }
}

impl CapabilityAdapter for MayastorAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Mayastor
    }

    fn capabilities(&self) -> &BackendCapabilitySet {
        &self.capabilities
    }

    fn allocation_unit(&self) -> u64 {
        MIB
    }

    fn map_to_parameters(
        &self,
        requirement: &RequirementVector,
        size_bytes: u64,
    ) -> Result<ConcreteStorageParameters> {
        let params = tier_parameters(&self.name, &self.capabilities, requirement, size_bytes)?;
        Ok(self.decorate(params))
    }

    fn default_parameters(&self, size_bytes: u64) -> ConcreteStorageParameters {
        let params = ConcreteStorageParameters::from_tier(
            &self.name,
            &self.capabilities.default,
            None,
            size_bytes,
        );
        self.decorate(params)
    }
}
