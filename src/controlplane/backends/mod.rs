//! Storage Backend Capability Adapters
//!
//! Provides capability adapters for different storage backends:
//! - EBS: AWS block volumes (volume type + provisioned IOPS)
//! - Cinder: OpenStack block volumes (volume types)
//! - Mayastor: NVMe-oF block volumes (pool labels + replicas)
//! - Loopback: local files, no profile support

pub mod cinder;
pub mod ebs;
pub mod loopback;
pub mod mayastor;

pub use cinder::*;
pub use ebs::*;
pub use loopback::*;
pub use mayastor::*;

use crate::domain::ports::{
    BackendCapabilitySet, BackendKind, CapabilityAdapter, ConcreteStorageParameters,
};
use crate::domain::profile::RequirementVector;
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Backend Configuration
// =============================================================================

/// One backend to register at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendEntry {
    /// Name requests use to address the backend
    pub name: String,
    /// Adapter implementation
    pub kind: BackendKind,
    /// Replaces the adapter's built-in capability table
    #[serde(default)]
    pub capabilities: Option<BackendCapabilitySet>,
    /// Adapter-specific settings (zone, namespace, root path, ...)
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

impl BackendEntry {
    /// Entry for a backend kind with its built-in table, named after the kind
    pub fn builtin(kind: BackendKind) -> Self {
        Self {
            name: kind.to_string(),
            kind,
            capabilities: None,
            settings: BTreeMap::new(),
        }
    }

    fn setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }
}

// =============================================================================
// Backend Factory
// =============================================================================

/// Factory for creating capability adapters
pub struct BackendFactory;

impl BackendFactory {
    /// Create an adapter from a configuration entry
    pub fn create(entry: &BackendEntry) -> Result<Arc<dyn CapabilityAdapter>> {
        if entry.name.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "{} backend entry has an empty name",
                entry.kind
            )));
        }

        let adapter: Arc<dyn CapabilityAdapter> = match entry.kind {
            BackendKind::Ebs => {
                let config = EbsConfig {
                    zone: entry.setting("zone"),
                    encrypted: parse_flag(entry, "encrypted")?,
                };
                let capabilities = entry
                    .capabilities
                    .clone()
                    .unwrap_or_else(EbsAdapter::builtin_capabilities);
                Arc::new(EbsAdapter::with_capabilities(&entry.name, config, capabilities))
            }
            BackendKind::Cinder => {
                let config = CinderConfig {
                    availability_zone: entry.setting("availabilityZone"),
                };
                let capabilities = entry
                    .capabilities
                    .clone()
                    .unwrap_or_else(CinderAdapter::builtin_capabilities);
                Arc::new(CinderAdapter::with_capabilities(&entry.name, config, capabilities))
            }
            BackendKind::Mayastor => {
                let mut config = MayastorConfig::default();
                if let Some(namespace) = entry.setting("namespace") {
                    config.namespace = namespace;
                }
                if let Some(protocol) = entry.setting("protocol") {
                    config.protocol = protocol;
                }
                let capabilities = entry
                    .capabilities
                    .clone()
                    .unwrap_or_else(MayastorAdapter::builtin_capabilities);
                Arc::new(MayastorAdapter::with_capabilities(&entry.name, config, capabilities))
            }
            BackendKind::Loopback => {
                let mut config = LoopbackConfig::default();
                if let Some(root) = entry.setting("root") {
                    config.root = root;
                }
                let capabilities = entry
                    .capabilities
                    .clone()
                    .unwrap_or_else(LoopbackAdapter::builtin_capabilities);
                Arc::new(LoopbackAdapter::with_capabilities(&entry.name, config, capabilities))
            }
        };

        adapter.capabilities().validate(adapter.name())?;
        Ok(adapter)
    }

    /// Entries for every built-in backend
    pub fn builtin_entries() -> Vec<BackendEntry> {
        [
            BackendKind::Ebs,
            BackendKind::Cinder,
            BackendKind::Mayastor,
            BackendKind::Loopback,
        ]
        .into_iter()
        .map(BackendEntry::builtin)
        .collect()
    }
}

fn parse_flag(entry: &BackendEntry, key: &str) -> Result<bool> {
    match entry.settings.get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) if v == "true" => Ok(true),
        Some(v) if v == "false" => Ok(false),
        Some(v) => Err(Error::Configuration(format!(
            "backend {}: setting {} must be true or false, got {}",
            entry.name, key, v
        ))),
    }
}

/// Look up the tier for a requirement and build its parameters
pub(crate) fn tier_parameters(
    backend: &str,
    capabilities: &BackendCapabilitySet,
    requirement: &RequirementVector,
    size_bytes: u64,
) -> Result<ConcreteStorageParameters> {
    let tier = capabilities
        .tier(requirement.profile)
        .ok_or_else(|| Error::UnsupportedProfile {
            backend: backend.to_string(),
            profile: requirement.profile,
        })?;

    Ok(ConcreteStorageParameters::from_tier(
        backend,
        tier,
        Some(requirement.profile),
        size_bytes,
    ))
}
