//! OpenStack Cinder Capability Adapter
//!
//! Profiles select a Cinder volume type. The built-in table uses the
//! volume types most deployments define; operators usually override it.

use super::tier_parameters;
use crate::domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
    TierCapability,
};
use crate::domain::profile::{PerformanceTier, Profile, RequirementVector};
use crate::domain::units::GIB;
use crate::error::Result;

/// Configuration for the Cinder adapter
#[derive(Debug, Clone, Default)]
pub struct CinderConfig {
    /// Availability zone volumes are created in
    pub availability_zone: Option<String>,
}

/// Capability adapter for OpenStack Cinder
#[derive(Debug)]
pub struct CinderAdapter {
    name: String,
    config: CinderConfig,
    capabilities: BackendCapabilitySet,
}

impl CinderAdapter {
    /// Create an adapter with the built-in capability table
    pub fn new(name: impl Into<String>, config: CinderConfig) -> Self {
        Self::with_capabilities(name, config, Self::builtin_capabilities())
    }

    /// Create an adapter with a custom capability table
    pub fn with_capabilities(
        name: impl Into<String>,
        config: CinderConfig,
        capabilities: BackendCapabilitySet,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            capabilities,
        }
    }

    pub fn builtin_capabilities() -> BackendCapabilitySet {
        BackendCapabilitySet::unprofiled(TierCapability::new("standard", PerformanceTier::Medium))
            .with_tier(
                Profile::Gold,
                TierCapability::new("high-iops", PerformanceTier::High),
            )
            .with_tier(
                Profile::Silver,
                TierCapability::new("standard", PerformanceTier::Medium),
            )
            .with_tier(
                Profile::Bronze,
                TierCapability::new("archive", PerformanceTier::Low),
            )
    }

    fn decorate(&self, mut params: ConcreteStorageParameters) -> ConcreteStorageParameters {
        params
            .parameters
            .insert("volumeType".to_string(), params.volume_class.clone());
        // Cinder sizes volumes in whole GiB
        params
            .parameters
            .insert("sizeGb".to_string(), (params.size_bytes / GIB).to_string());
        if let Some(zone) = &self.config.availability_zone {
            params
                .parameters
                .insert("availabilityZone".to_string(), zone.clone());
        }
        params
    }
}

impl CapabilityAdapter for CinderAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Cinder
    }

    fn capabilities(&self) -> &BackendCapabilitySet {
        &self.capabilities
    }

    fn allocation_unit(&self) -> u64 {
        GIB
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
