//! Backend Registry
//!
//! Table of registered capability adapters keyed by backend name. The
//! registry is assembled once at startup through [`BackendRegistryBuilder`]
//! and is immutable afterwards, so resolutions read it without locking.

use crate::controlplane::backends::{BackendEntry, BackendFactory};
use crate::domain::ports::{CapabilityAdapter, CapabilityAdapterRef};
use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide registry, installed once
static GLOBAL_REGISTRY: OnceCell<Arc<BackendRegistry>> = OnceCell::new();

// =============================================================================
// Builder
// =============================================================================

/// Collects adapters before the registry is frozen
#[derive(Debug, Default)]
pub struct BackendRegistryBuilder {
    backends: BTreeMap<String, CapabilityAdapterRef>,
}

impl BackendRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter
    ///
    /// The adapter's capability table is validated; duplicate names are
    /// rejected.
    pub fn register(mut self, adapter: Arc<dyn CapabilityAdapter>) -> Result<Self> {
        let name = adapter.name().to_string();
        if self.backends.contains_key(&name) {
            return Err(Error::BackendAlreadyRegistered { backend: name });
        }

        adapter.capabilities().validate(&name)?;

        info!(
            backend = %name,
            kind = %adapter.kind(),
            profiles = ?adapter.capabilities().supported_profiles(),
            "Registering backend"
        );

        self.backends.insert(name, adapter);
        Ok(self)
    }

    /// Create and register an adapter from a configuration entry
    pub fn register_entry(self, entry: &BackendEntry) -> Result<Self> {
        let adapter = BackendFactory::create(entry)?;
        self.register(adapter)
    }

    /// Freeze the registry
    pub fn build(self) -> Arc<BackendRegistry> {
        debug!("Backend registry built with {} backends", self.backends.len());
        Arc::new(BackendRegistry {
            backends: self.backends,
        })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Immutable table of capability adapters
#[derive(Debug)]
pub struct BackendRegistry {
    backends: BTreeMap<String, CapabilityAdapterRef>,
}

impl BackendRegistry {
    pub fn builder() -> BackendRegistryBuilder {
        BackendRegistryBuilder::new()
    }

    /// Build a registry from configuration entries
    pub fn from_entries(entries: &[BackendEntry]) -> Result<Arc<Self>> {
        entries
            .iter()
            .try_fold(Self::builder(), |builder, entry| builder.register_entry(entry))
            .map(BackendRegistryBuilder::build)
    }

    /// Look up an adapter by backend name
    pub fn get(&self, name: &str) -> Result<&CapabilityAdapterRef> {
        self.backends
            .get(name)
            .ok_or_else(|| Error::UnsupportedBackend {
                backend: name.to_string(),
            })
    }

    /// Registered backend names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    pub fn adapters(&self) -> impl Iterator<Item = &CapabilityAdapterRef> {
        self.backends.values()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

// =============================================================================
// Global Registry
// =============================================================================

/// Install the process-wide registry
///
/// Succeeds exactly once; later calls fail with `RegistryAlreadyInitialized`
/// and leave the installed registry untouched.
pub fn install_global(registry: Arc<BackendRegistry>) -> Result<Arc<BackendRegistry>> {
    GLOBAL_REGISTRY
        .set(registry.clone())
        .map_err(|_| Error::RegistryAlreadyInitialized)?;
    info!("Global backend registry installed ({} backends)", registry.len());
    Ok(registry)
}

/// The process-wide registry
pub fn global() -> Result<Arc<BackendRegistry>> {
    GLOBAL_REGISTRY
        .get()
        .cloned()
        .ok_or(Error::RegistryNotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::{EbsAdapter, EbsConfig, LoopbackAdapter, LoopbackConfig};
    use crate::domain::ports::BackendKind;
    use assert_matches::assert_matches;

    #[test]
    fn test_register_and_lookup() {
        let registry = BackendRegistry::builder()
            .register(Arc::new(EbsAdapter::new("ebs", EbsConfig::default())))
            .unwrap()
            .register(Arc::new(LoopbackAdapter::new("loopback", LoopbackConfig::default())))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["ebs", "loopback"]);
        assert_eq!(registry.get("ebs").unwrap().kind(), BackendKind::Ebs);
        assert_matches!(
            registry.get("nfs"),
            Err(Error::UnsupportedBackend { backend }) if backend == "nfs"
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = BackendRegistry::builder()
            .register(Arc::new(EbsAdapter::new("ebs", EbsConfig::default())))
            .unwrap()
            .register(Arc::new(EbsAdapter::new("ebs", EbsConfig::default())));

        assert_matches!(result, Err(Error::BackendAlreadyRegistered { backend }) if backend == "ebs");
    }

    #[test]
    fn test_from_builtin_entries() {
        let registry = BackendRegistry::from_entries(&BackendFactory::builtin_entries()).unwrap();
        assert_eq!(registry.names(), vec!["cinder", "ebs", "loopback", "mayastor"]);
    }

    #[test]
    fn test_global_installs_once() {
        let first = BackendRegistry::from_entries(&BackendFactory::builtin_entries()).unwrap();
        install_global(first.clone()).unwrap();

        let second = BackendRegistry::builder().build();
        assert_matches!(install_global(second), Err(Error::RegistryAlreadyInitialized));

        let installed = global().unwrap();
        assert!(Arc::ptr_eq(&installed, &first));
    }
}
