//! Resolution Metrics
//!
//! Lock-free counters bumped on every resolution, rendered into the
//! Prometheus text format on scrape.

use crate::domain::ports::ParameterSource;
use crate::error::{Error, Result};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Resolution outcome counters
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    /// Resolved to the backend default class
    pub resolved_default: AtomicU64,
    /// Resolved to the requested profile's tier
    pub resolved_profile: AtomicU64,
    /// Resolved through the fallback policy
    pub resolved_fallback: AtomicU64,
    pub unsupported_backend: AtomicU64,
    pub unsupported_profile: AtomicU64,
    pub invalid_profile: AtomicU64,
    /// Any other failure
    pub other_errors: AtomicU64,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_success(&self, source: ParameterSource) {
        let counter = match source {
            ParameterSource::Default => &self.resolved_default,
            ParameterSource::Profile => &self.resolved_profile,
            ParameterSource::Fallback(_) => &self.resolved_fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self, error: &Error) {
        let counter = match error {
            Error::UnsupportedBackend { .. } => &self.unsupported_backend,
            Error::UnsupportedProfile { .. } => &self.unsupported_profile,
            Error::InvalidProfileName { .. } => &self.invalid_profile,
            _ => &self.other_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ResolutionMetricsSnapshot {
        ResolutionMetricsSnapshot {
            resolved_default: self.resolved_default.load(Ordering::Relaxed),
            resolved_profile: self.resolved_profile.load(Ordering::Relaxed),
            resolved_fallback: self.resolved_fallback.load(Ordering::Relaxed),
            unsupported_backend: self.unsupported_backend.load(Ordering::Relaxed),
            unsupported_profile: self.unsupported_profile.load(Ordering::Relaxed),
            invalid_profile: self.invalid_profile.load(Ordering::Relaxed),
            other_errors: self.other_errors.load(Ordering::Relaxed),
        }
    }

    /// Render current counters in the Prometheus text format
    pub fn encode_prometheus(&self) -> Result<String> {
        let snapshot = self.snapshot();
        let registry = Registry::new();

        let resolutions = IntCounterVec::new(
            Opts::new(
                "storage_profiles_resolutions_total",
                "Profile resolutions by outcome",
            ),
            &["outcome"],
        )
        .map_err(|e| Error::Internal(format!("metric definition: {}", e)))?;
        registry
            .register(Box::new(resolutions.clone()))
            .map_err(|e| Error::Internal(format!("metric registration: {}", e)))?;

        for (outcome, value) in snapshot.by_outcome() {
            resolutions
                .with_label_values(&[outcome])
                .inc_by(value);
        }

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .map_err(|e| Error::Internal(format!("metric encoding: {}", e)))?;

        String::from_utf8(buffer).map_err(|e| Error::Internal(format!("metric encoding: {}", e)))
    }
}

/// Point-in-time copy of [`ResolutionMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetricsSnapshot {
    pub resolved_default: u64,
    pub resolved_profile: u64,
    pub resolved_fallback: u64,
    pub unsupported_backend: u64,
    pub unsupported_profile: u64,
    pub invalid_profile: u64,
    pub other_errors: u64,
}

impl ResolutionMetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.by_outcome().iter().map(|(_, v)| v).sum()
    }

    fn by_outcome(&self) -> [(&'static str, u64); 7] {
        [
            ("default", self.resolved_default),
            ("profile", self.resolved_profile),
            ("fallback", self.resolved_fallback),
            ("unsupported_backend", self.unsupported_backend),
            ("unsupported_profile", self.unsupported_profile),
            ("invalid_profile", self.invalid_profile),
            ("error", self.other_errors),
        ]
    }
}
