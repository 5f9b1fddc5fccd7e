//! Resolution Engine
//!
//! Turns a volume request into concrete backend parameters in a single
//! synchronous pass:
//! 1. Look up the target backend's adapter
//! 2. No profile: use the backend default class
//! 3. Unsupported profile: hand over to the fallback policy
//! 4. Otherwise: map the profile's requirement through the adapter

use crate::controlplane::metrics::ResolutionMetrics;
use crate::controlplane::registry::BackendRegistry;
use crate::domain::ports::{ConcreteStorageParameters, FallbackPolicy, VolumeRequest};
use crate::domain::profile::ProfileRegistry;
use crate::domain::units::{allocated_size, DEFAULT_VOLUME_SIZE_BYTES};
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for the resolution engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Applied when a backend lacks the requested profile
    pub fallback_policy: FallbackPolicy,
    /// Size used when a request does not give one
    pub default_size_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::Reject,
            default_size_bytes: DEFAULT_VOLUME_SIZE_BYTES,
        }
    }
}

// =============================================================================
// Resolution Engine
// =============================================================================

/// Resolves volume requests against an immutable backend registry
///
/// Resolutions share no mutable state apart from atomic counters and may
/// run concurrently from any number of threads.
#[derive(Clone)]
pub struct ResolutionEngine {
    config: EngineConfig,
    registry: Arc<BackendRegistry>,
    metrics: Arc<ResolutionMetrics>,
}

impl ResolutionEngine {
    pub fn new(config: EngineConfig, registry: Arc<BackendRegistry>) -> Self {
        Self {
            config,
            registry,
            metrics: Arc::new(ResolutionMetrics::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.config.fallback_policy
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<ResolutionMetrics> {
        &self.metrics
    }

    /// Resolve a request into concrete parameters
    pub fn resolve(&self, request: &VolumeRequest) -> Result<ConcreteStorageParameters> {
        let result = self.resolve_request(request);
        match &result {
            Ok(params) => {
                debug!(
                    backend = %params.backend,
                    requested = ?params.requested_profile,
                    effective = ?params.effective_profile,
                    class = %params.volume_class,
                    size_bytes = params.size_bytes,
                    "Resolved storage parameters"
                );
                self.metrics.record_success(params.source);
            }
            Err(e) => {
                debug!(backend = %request.backend, error = %e, "Resolution failed");
                self.metrics.record_error(e);
            }
        }
        result
    }

    fn resolve_request(&self, request: &VolumeRequest) -> Result<ConcreteStorageParameters> {
        let adapter = self.registry.get(&request.backend)?;

        let size_bytes = allocated_size(
            adapter.allocation_unit(),
            request.size_bytes.unwrap_or(self.config.default_size_bytes),
        );

        let profile = match request.profile {
            Some(profile) => profile,
            None => return Ok(adapter.default_parameters(size_bytes)),
        };

        let requirement = ProfileRegistry::resolve_requirement(profile);
        let mut params = if adapter.supports(profile) {
            adapter.map_to_parameters(&requirement, size_bytes)?
        } else {
            self.config
                .fallback_policy
                .apply(adapter.as_ref(), &requirement, size_bytes)?
        };
        params.requested_profile = Some(profile);

        Ok(params)
    }
}
