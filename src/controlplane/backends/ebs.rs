//! EBS Capability Adapter
//!
//! Maps profiles onto AWS EBS volume types:
//! - Gold: provisioned IOPS (`io1`), 30 IOPS per GiB up to 20000
//! - Silver: general purpose SSD (`gp2`), baseline IOPS only
//! - Bronze: magnetic (`standard`)

use super::tier_parameters;
use crate::domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
    TierCapability,
};
use crate::domain::profile::{PerformanceTier, Profile, RequirementVector};
use crate::domain::units::GIB;
use crate::error::Result;

/// Provisioned IOPS per GiB for the gold tier
pub const EBS_GOLD_IOPS_PER_GIB: u64 = 30;

/// Maximum IOPS EBS accepts for an `io1` volume
pub const EBS_IO1_MAX_IOPS: u64 = 20_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the EBS adapter
#[derive(Debug, Clone, Default)]
pub struct EbsConfig {
    /// Availability zone volumes are created in
    pub zone: Option<String>,
    /// Request encrypted volumes
    pub encrypted: bool,
}

// =============================================================================
// EBS Adapter
// =============================================================================

/// Capability adapter for AWS EBS
#[derive(Debug)]
pub struct EbsAdapter {
    name: String,
    config: EbsConfig,
    capabilities: BackendCapabilitySet,
}

impl EbsAdapter {
    /// Create an adapter with the built-in capability table
    pub fn new(name: impl Into<String>, config: EbsConfig) -> Self {
        Self::with_capabilities(name, config, Self::builtin_capabilities())
    }

    /// Create an adapter with a custom capability table
    pub fn with_capabilities(
        name: impl Into<String>,
        config: EbsConfig,
        capabilities: BackendCapabilitySet,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            capabilities,
        }
    }

    /// Built-in table; the default class is the bronze class
    pub fn builtin_capabilities() -> BackendCapabilitySet {
        let gold = TierCapability {
            iops_per_gib: Some(EBS_GOLD_IOPS_PER_GIB),
            max_iops: Some(EBS_IO1_MAX_IOPS),
            ..TierCapability::new("io1", PerformanceTier::High)
        };
        // gp2 takes no IOPS request; it bursts from a per-GiB baseline
        let silver = TierCapability::new("gp2", PerformanceTier::Medium);
        let bronze = TierCapability::new("standard", PerformanceTier::Low);

        BackendCapabilitySet::unprofiled(bronze.clone())
            .with_tier(Profile::Gold, gold)
            .with_tier(Profile::Silver, silver)
            .with_tier(Profile::DEFAULT, bronze)
    }

    fn decorate(&self, mut params: ConcreteStorageParameters) -> ConcreteStorageParameters {
        params
            .parameters
            .insert("volumeType".to_string(), params.volume_class.clone());
        if let Some(iops) = params.iops {
            params.parameters.insert("iops".to_string(), iops.to_string());
        }
        if let Some(zone) = &self.config.zone {
            params.parameters.insert("zone".to_string(), zone.clone());
        }
        if self.config.encrypted {
            params
                .parameters
                .insert("encrypted".to_string(), "true".to_string());
        }
        params
    }
}

impl CapabilityAdapter for EbsAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Ebs
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
