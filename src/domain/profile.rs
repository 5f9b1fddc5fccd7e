//! Storage Profiles and the Profile Registry
//!
//! A profile names a qualitative tier of service. What each tier means
//! concretely is up to the backend; the registry only fixes the abstract
//! requirement every backend must honor.

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// Profile
// =============================================================================

/// Mandatory storage profiles
///
/// Variants are declared cheapest first so the derived ordering matches the
/// documented ranking `Gold > Silver > Bronze`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Cheap storage
    Bronze,
    /// Intermediate storage
    Silver,
    /// Fast storage
    Gold,
}

impl Profile {
    /// Profile a profile-aware driver uses when the caller names none
    pub const DEFAULT: Profile = Profile::Bronze;

    /// All profiles, fastest first
    pub const ALL: [Profile; 3] = [Profile::Gold, Profile::Silver, Profile::Bronze];

    /// Wire name of the profile
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Gold => "gold",
            Profile::Silver => "silver",
            Profile::Bronze => "bronze",
        }
    }

    /// Next cheaper profile, if any
    pub fn downgrade(&self) -> Option<Profile> {
        match self {
            Profile::Gold => Some(Profile::Silver),
            Profile::Silver => Some(Profile::Bronze),
            Profile::Bronze => None,
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gold" => Ok(Profile::Gold),
            "silver" => Ok(Profile::Silver),
            "bronze" => Ok(Profile::Bronze),
            _ => Err(Error::InvalidProfileName { name: s.to_string() }),
        }
    }
}

// =============================================================================
// Requirement Tiers
// =============================================================================

/// Abstract performance level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceTier::Low => write!(f, "low"),
            PerformanceTier::Medium => write!(f, "medium"),
            PerformanceTier::High => write!(f, "high"),
        }
    }
}

/// Abstract cost level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for CostTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostTier::Low => write!(f, "low"),
            CostTier::Medium => write!(f, "medium"),
            CostTier::High => write!(f, "high"),
        }
    }
}

/// Desired service attributes derived from a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementVector {
    pub profile: Profile,
    pub performance: PerformanceTier,
    pub cost: CostTier,
}

// =============================================================================
// Profile Registry
// =============================================================================

/// Static mapping of profiles to requirement vectors
pub struct ProfileRegistry;

impl ProfileRegistry {
    /// Resolve the abstract requirement for a profile
    pub const fn resolve_requirement(profile: Profile) -> RequirementVector {
        let (performance, cost) = match profile {
            Profile::Gold => (PerformanceTier::High, CostTier::High),
            Profile::Silver => (PerformanceTier::Medium, CostTier::Medium),
            Profile::Bronze => (PerformanceTier::Low, CostTier::Low),
        };
        RequirementVector {
            profile,
            performance,
            cost,
        }
    }

    /// Requirement vectors for every profile, fastest first
    pub fn all() -> [RequirementVector; 3] {
        Profile::ALL.map(Self::resolve_requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_profile_parse() {
        assert_eq!("gold".parse::<Profile>().unwrap(), Profile::Gold);
        assert_eq!(" Silver ".parse::<Profile>().unwrap(), Profile::Silver);
        assert_eq!("BRONZE".parse::<Profile>().unwrap(), Profile::Bronze);

        assert_matches!(
            "platinum".parse::<Profile>(),
            Err(Error::InvalidProfileName { name }) if name == "platinum"
        );
        assert!("".parse::<Profile>().is_err());
    }

    #[test]
    fn test_profile_ordering() {
        assert!(Profile::Gold > Profile::Silver);
        assert!(Profile::Silver > Profile::Bronze);
        assert_eq!(Profile::DEFAULT, Profile::Bronze);
        assert_eq!(Profile::Gold.downgrade(), Some(Profile::Silver));
        assert_eq!(Profile::Bronze.downgrade(), None);
    }

    #[test]
    fn test_profile_serde_names() {
        assert_eq!(serde_json::to_string(&Profile::Gold).unwrap(), "\"gold\"");
        let parsed: Profile = serde_json::from_str("\"bronze\"").unwrap();
        assert_eq!(parsed, Profile::Bronze);
    }

    #[test]
    fn test_requirements_follow_profile_order() {
        let [gold, silver, bronze] = ProfileRegistry::all();
        assert!(gold.performance > silver.performance);
        assert!(silver.performance > bronze.performance);
        assert!(gold.cost > silver.cost);
        assert!(silver.cost > bronze.cost);
        assert_eq!(gold.profile, Profile::Gold);
    }

    #[test]
    fn test_resolve_requirement_is_pure() {
        for profile in Profile::ALL {
            assert_eq!(
                ProfileRegistry::resolve_requirement(profile),
                ProfileRegistry::resolve_requirement(profile)
            );
        }
    }
}
