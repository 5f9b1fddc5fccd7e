//! Loopback Capability Adapter
//!
//! Volumes are sparse files under a local directory. The backend has a
//! single class and supports no profiles; requests naming one go through
//! the fallback policy.

use crate::domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
    TierCapability,
};
use crate::domain::profile::{PerformanceTier, RequirementVector};
use crate::domain::units::MIB;
use crate::error::Result;

/// Configuration for the loopback adapter
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Directory backing files are created in
    pub root: String,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            root: "/var/lib/storage-profiles/loopback".to_string(),
        }
    }
}

/// Capability adapter for loopback files
#[derive(Debug)]
pub struct LoopbackAdapter {
    name: String,
    config: LoopbackConfig,
    capabilities: BackendCapabilitySet,
}

impl LoopbackAdapter {
    pub fn new(name: impl Into<String>, config: LoopbackConfig) -> Self {
        Self::with_capabilities(name, config, Self::builtin_capabilities())
    }

    pub fn with_capabilities(
        name: impl Into<String>,
        config: LoopbackConfig,
        capabilities: BackendCapabilitySet,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            capabilities,
        }
    }

    pub fn builtin_capabilities() -> BackendCapabilitySet {
        BackendCapabilitySet::unprofiled(TierCapability::new("loopback", PerformanceTier::Low))
    }

    fn decorate(&self, mut params: ConcreteStorageParameters) -> ConcreteStorageParameters {
        params
            .parameters
            .insert("root".to_string(), self.config.root.clone());
        params
    }
}

impl CapabilityAdapter for LoopbackAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Loopback
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
        let params =
            super::tier_parameters(&self.name, &self.capabilities, requirement, size_bytes)?;
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
