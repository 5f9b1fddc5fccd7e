//! Fallback Policy
//!
//! Applied when a request names a profile the target backend does not
//! offer. The policy is chosen at configuration time and applied to every
//! backend alike.

use crate::domain::ports::{
    CapabilityAdapter, ConcreteStorageParameters, FallbackPolicy, ParameterSource,
};
use crate::domain::profile::{Profile, ProfileRegistry, RequirementVector};
use crate::error::{Error, Result};
use tracing::{info, warn};

impl FallbackPolicy {
    /// Produce parameters for a requirement the adapter does not support
    pub fn apply(
        &self,
        adapter: &dyn CapabilityAdapter,
        requirement: &RequirementVector,
        size_bytes: u64,
    ) -> Result<ConcreteStorageParameters> {
        let unsupported = || Error::UnsupportedProfile {
            backend: adapter.name().to_string(),
            profile: requirement.profile,
        };

        match self {
            FallbackPolicy::Reject => Err(unsupported()),

            FallbackPolicy::BestEffort => {
                let substitute = nearest_supported(adapter, requirement).ok_or_else(unsupported)?;
                warn!(
                    backend = %adapter.name(),
                    requested = %requirement.profile,
                    substitute = %substitute,
                    "Profile unsupported, substituting nearest cheaper tier"
                );
                let mut params = adapter.map_to_parameters(
                    &ProfileRegistry::resolve_requirement(substitute),
                    size_bytes,
                )?;
                params.source = ParameterSource::Fallback(*self);
                Ok(params)
            }

            FallbackPolicy::Default => {
                info!(
                    backend = %adapter.name(),
                    profile = %requirement.profile,
                    "Profile dropped, backend default class used"
                );
                let mut params = adapter.default_parameters(size_bytes);
                params.source = ParameterSource::Fallback(*self);
                Ok(params)
            }
        }
    }
}

/// Fastest supported profile whose cost does not exceed the requirement's
pub fn nearest_supported(
    adapter: &dyn CapabilityAdapter,
    requirement: &RequirementVector,
) -> Option<Profile> {
    Profile::ALL.into_iter().find(|profile| {
        adapter.supports(*profile)
            && ProfileRegistry::resolve_requirement(*profile).cost <= requirement.cost
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::backends::{
        LoopbackAdapter, LoopbackConfig, MayastorAdapter, MayastorConfig,
    };
    use crate::domain::units::MIB;
    use assert_matches::assert_matches;

    fn mayastor() -> MayastorAdapter {
        MayastorAdapter::new("mayastor", MayastorConfig::default())
    }

    #[test]
    fn test_reject() {
        let req = ProfileRegistry::resolve_requirement(Profile::Silver);
        assert_matches!(
            FallbackPolicy::Reject.apply(&mayastor(), &req, MIB),
            Err(Error::UnsupportedProfile { profile: Profile::Silver, .. })
        );
    }

    #[test]
    fn test_best_effort_never_exceeds_cost() {
        let adapter = mayastor();
        let silver = ProfileRegistry::resolve_requirement(Profile::Silver);
        assert_eq!(nearest_supported(&adapter, &silver), Some(Profile::Bronze));

        let params = FallbackPolicy::BestEffort.apply(&adapter, &silver, MIB).unwrap();
        assert_eq!(params.effective_profile, Some(Profile::Bronze));
        assert_eq!(params.volume_class, "tier=cold");
        assert_eq!(params.source, ParameterSource::Fallback(FallbackPolicy::BestEffort));
    }

    #[test]
    fn test_best_effort_without_candidate() {
        let adapter = LoopbackAdapter::new("loopback", LoopbackConfig::default());
        let gold = ProfileRegistry::resolve_requirement(Profile::Gold);
        assert_eq!(nearest_supported(&adapter, &gold), None);
        assert_matches!(
            FallbackPolicy::BestEffort.apply(&adapter, &gold, MIB),
            Err(Error::UnsupportedProfile { .. })
        );
    }

    #[test]
    fn test_default_drops_profile() {
        let adapter = LoopbackAdapter::new("loopback", LoopbackConfig::default());
        let gold = ProfileRegistry::resolve_requirement(Profile::Gold);

        let params = FallbackPolicy::Default.apply(&adapter, &gold, MIB).unwrap();
        assert_eq!(params.effective_profile, None);
        assert_eq!(params.volume_class, "loopback");
        assert_eq!(params.source, ParameterSource::Fallback(FallbackPolicy::Default));
    }
}
