//! Domain Ports - Core trait definitions for profile resolution
//!
//! These types define the boundary between the resolution engine and the
//! per-backend adapters that give profiles a concrete meaning.

use crate::domain::profile::{PerformanceTier, Profile, RequirementVector};
use crate::domain::units::to_gib_ceil;
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Metadata key carrying a dataset's requested profile name
pub const PROFILE_METADATA_KEY: &str = "storage-profile";

// =============================================================================
// Backend Kinds
// =============================================================================

/// Storage backends with a capability adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// AWS Elastic Block Store
    Ebs,
    /// OpenStack Cinder
    Cinder,
    /// OpenEBS Mayastor
    Mayastor,
    /// Local loopback files, no profile support
    Loopback,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Ebs => write!(f, "ebs"),
            BackendKind::Cinder => write!(f, "cinder"),
            BackendKind::Mayastor => write!(f, "mayastor"),
            BackendKind::Loopback => write!(f, "loopback"),
        }
    }
}

// =============================================================================
// Fallback Policy
// =============================================================================

/// What to do when a backend cannot honor the requested profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Fail the request with `UnsupportedProfile`
    #[default]
    Reject,
    /// Use the nearest supported tier not exceeding the requested cost
    BestEffort,
    /// Drop the profile and use the backend default
    Default,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackPolicy::Reject => write!(f, "reject"),
            FallbackPolicy::BestEffort => write!(f, "best-effort"),
            FallbackPolicy::Default => write!(f, "default"),
        }
    }
}

impl std::str::FromStr for FallbackPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(FallbackPolicy::Reject),
            "best-effort" | "besteffort" | "best_effort" => Ok(FallbackPolicy::BestEffort),
            "default" => Ok(FallbackPolicy::Default),
            other => Err(Error::Configuration(format!(
                "unknown fallback policy: {}. Use 'reject', 'best-effort' or 'default'",
                other
            ))),
        }
    }
}

// =============================================================================
// Capability Tables
// =============================================================================

/// Concrete parameters one tier maps to on a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierCapability {
    /// Backend class name (volume type, pool label, ...)
    pub class: String,
    /// Performance this class delivers relative to the others
    pub performance: PerformanceTier,
    /// Provisioned IOPS per GiB of volume size
    #[serde(default)]
    pub iops_per_gib: Option<u64>,
    /// Upper bound on provisioned IOPS
    #[serde(default)]
    pub max_iops: Option<u64>,
    /// Replica count
    #[serde(default)]
    pub replicas: Option<u32>,
    /// Additional backend parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl TierCapability {
    /// Create a tier with only a class and performance level
    pub fn new(class: impl Into<String>, performance: PerformanceTier) -> Self {
        Self {
            class: class.into(),
            performance,
            iops_per_gib: None,
            max_iops: None,
            replicas: None,
            parameters: BTreeMap::new(),
        }
    }

    /// IOPS to request for a volume of the given size, capped at `max_iops`
    ///
    /// `None` when the class does not take an IOPS request.
    pub fn requested_iops(&self, size_gib: u64) -> Option<u64> {
        let iops = size_gib.saturating_mul(self.iops_per_gib?);
        Some(match self.max_iops {
            Some(max) => iops.min(max),
            None => iops,
        })
    }

    /// Whether this tier promises less than `other`
    ///
    /// IOPS rules are compared only when both tiers take an IOPS request.
    fn is_slower_than(&self, other: &TierCapability) -> bool {
        let below = |ours: Option<u64>, theirs: Option<u64>| {
            matches!((ours, theirs), (Some(a), Some(b)) if a < b)
        };

        self.performance < other.performance
            || below(self.iops_per_gib, other.iops_per_gib)
            || below(self.max_iops, other.max_iops)
    }
}

/// Which profiles a backend supports and what each maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendCapabilitySet {
    /// Class used when no profile is requested
    pub default: TierCapability,
    /// Supported profiles
    #[serde(default)]
    pub tiers: BTreeMap<Profile, TierCapability>,
}

impl BackendCapabilitySet {
    /// A capability set with no profile support
    pub fn unprofiled(default: TierCapability) -> Self {
        Self {
            default,
            tiers: BTreeMap::new(),
        }
    }

    pub fn with_tier(mut self, profile: Profile, tier: TierCapability) -> Self {
        self.tiers.insert(profile, tier);
        self
    }

    pub fn supports(&self, profile: Profile) -> bool {
        self.tiers.contains_key(&profile)
    }

    pub fn tier(&self, profile: Profile) -> Option<&TierCapability> {
        self.tiers.get(&profile)
    }

    /// Supported profiles, fastest first
    pub fn supported_profiles(&self) -> Vec<Profile> {
        self.tiers.keys().rev().copied().collect()
    }

    /// Check the table before it is registered
    ///
    /// Classes must be named and no supported profile may declare lower
    /// performance than a cheaper supported profile.
    pub fn validate(&self, backend: &str) -> Result<()> {
        if self.default.class.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "backend {}: default class must not be empty",
                backend
            )));
        }

        let mut cheaper: Vec<(Profile, &TierCapability)> = Vec::with_capacity(self.tiers.len());
        for (profile, tier) in &self.tiers {
            if tier.class.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "backend {}: class for profile {} must not be empty",
                    backend, profile
                )));
            }
            if let Some((lower, _)) = cheaper
                .iter()
                .find(|(_, lower_tier)| tier.is_slower_than(lower_tier))
            {
                return Err(Error::CapabilityOrderingViolated {
                    backend: backend.to_string(),
                    higher: *profile,
                    lower: *lower,
                });
            }
            cheaper.push((*profile, tier));
        }

        Ok(())
    }
}

// =============================================================================
// Request / Result
// =============================================================================

/// Request to resolve storage parameters for a new volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRequest {
    /// Registered backend name
    pub backend: String,
    /// Requested profile
    #[serde(default)]
    pub profile: Option<Profile>,
    /// Requested size in bytes
    #[serde(default)]
    pub size_bytes: Option<u64>,
    /// Dataset the volume will hold
    #[serde(default)]
    pub dataset_id: Option<String>,
    /// Dataset metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl VolumeRequest {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            profile: None,
            size_bytes: None,
            dataset_id: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_dataset_id(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }

    /// Build a request from dataset metadata
    ///
    /// The profile comes from [`PROFILE_METADATA_KEY`]; an empty value means
    /// no profile.
    pub fn from_metadata(
        backend: impl Into<String>,
        size_bytes: Option<u64>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self> {
        let profile = match metadata.get(PROFILE_METADATA_KEY) {
            Some(name) if !name.trim().is_empty() => Some(name.parse::<Profile>()?),
            _ => None,
        };

        Ok(Self {
            backend: backend.into(),
            profile,
            size_bytes,
            dataset_id: None,
            metadata,
        })
    }
}

/// Where a set of parameters came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "policy", rename_all = "kebab-case")]
pub enum ParameterSource {
    /// Backend default class, no profile involved
    Default,
    /// The requested profile's tier
    Profile,
    /// Produced by the fallback policy
    Fallback(FallbackPolicy),
}

/// Concrete parameters handed to the backend's create call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcreteStorageParameters {
    pub backend: String,
    pub requested_profile: Option<Profile>,
    pub effective_profile: Option<Profile>,
    pub source: ParameterSource,
    pub volume_class: String,
    pub performance: PerformanceTier,
    /// Size after rounding to the allocation unit
    pub size_bytes: u64,
    pub iops: Option<u64>,
    pub replicas: Option<u32>,
    pub parameters: BTreeMap<String, String>,
}

impl ConcreteStorageParameters {
    /// Parameters for a tier, with IOPS computed from the size
    pub fn from_tier(
        backend: &str,
        tier: &TierCapability,
        effective_profile: Option<Profile>,
        size_bytes: u64,
    ) -> Self {
        Self {
            backend: backend.to_string(),
            requested_profile: effective_profile,
            effective_profile,
            source: match effective_profile {
                Some(_) => ParameterSource::Profile,
                None => ParameterSource::Default,
            },
            volume_class: tier.class.clone(),
            performance: tier.performance,
            size_bytes,
            iops: tier.requested_iops(to_gib_ceil(size_bytes)),
            replicas: tier.replicas,
            parameters: tier.parameters.clone(),
        }
    }
}

// =============================================================================
// Capability Adapter Port
// =============================================================================

/// Per-backend translation of abstract requirements into parameters
///
/// Implementations own an immutable capability table built at
/// registration time.
pub trait CapabilityAdapter: std::fmt::Debug + Send + Sync {
    /// Registered backend name
    fn name(&self) -> &str;

    /// Backend kind
    fn kind(&self) -> BackendKind;

    /// The capability table
    fn capabilities(&self) -> &BackendCapabilitySet;

    /// Allocation granularity in bytes
    fn allocation_unit(&self) -> u64;

    /// Whether the backend offers a tier for this profile
    fn supports(&self, profile: Profile) -> bool {
        self.capabilities().supports(profile)
    }

    /// Translate a requirement into parameters for an allocated size
    fn map_to_parameters(
        &self,
        requirement: &RequirementVector,
        size_bytes: u64,
    ) -> Result<ConcreteStorageParameters>;

    /// Parameters for the backend's default class
    fn default_parameters(&self, size_bytes: u64) -> ConcreteStorageParameters;
}

pub type CapabilityAdapterRef = Arc<dyn CapabilityAdapter>;
