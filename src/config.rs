//! Resolver configuration
//!
//! Loaded once at startup from a YAML file. Names the fallback policy and
//! the backends to register, optionally overriding their capability tables.
//!
//! ```yaml
//! fallbackPolicy: best-effort
//! defaultVolumeSize: 100Gi
//! backends:
//!   - name: ebs
//!     kind: ebs
//!     settings:
//!       zone: us-east-1a
//!   - name: mayastor
//!     kind: mayastor
//! ```

use crate::controlplane::backends::{BackendEntry, BackendFactory};
use crate::controlplane::engine::EngineConfig;
use crate::controlplane::registry::BackendRegistry;
use crate::domain::ports::FallbackPolicy;
use crate::domain::units::parse_capacity;
use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Top-level resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Behavior when a backend lacks the requested profile
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    /// Size used when a request gives none (e.g. "100Gi")
    #[serde(default = "default_volume_size")]
    pub default_volume_size: String,

    /// Backends to register, in order
    #[serde(default = "BackendFactory::builtin_entries")]
    pub backends: Vec<BackendEntry>,
}

fn default_volume_size() -> String {
    "100Gi".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::default(),
            default_volume_size: default_volume_size(),
            backends: BackendFactory::builtin_entries(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a file
    ///
    /// Without a path, or when the file does not exist, the built-in
    /// configuration is used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                info!("No configuration file given, using built-in backends");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            warn!(
                "Configuration file {} not found, using built-in backends",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;
        info!(
            "Loaded configuration from {} ({} backends, fallback policy {})",
            path.display(),
            config.backends.len(),
            config.fallback_policy
        );
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: ResolverConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        self.default_size_bytes()?;
        if self.backends.is_empty() {
            return Err(Error::Configuration("no backends configured".into()));
        }
        Ok(())
    }

    pub fn default_size_bytes(&self) -> Result<u64> {
        let size = parse_capacity(&self.default_volume_size)?;
        if size == 0 {
            return Err(Error::Configuration(
                "defaultVolumeSize must be greater than zero".into(),
            ));
        }
        Ok(size)
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        Ok(EngineConfig {
            fallback_policy: self.fallback_policy,
            default_size_bytes: self.default_size_bytes()?,
        })
    }

    /// Register every configured backend
    pub fn build_registry(&self) -> Result<Arc<BackendRegistry>> {
        BackendRegistry::from_entries(&self.backends)
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(ResolverConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::BackendKind;
    use crate::domain::profile::Profile;
    use crate::domain::units::GIB;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.fallback_policy, FallbackPolicy::Reject);
        assert_eq!(config.default_size_bytes().unwrap(), 100 * GIB);
        assert_eq!(config.backends.len(), 4);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
fallbackPolicy: best-effort
defaultVolumeSize: 10Gi
backends:
  - name: ebs-west
    kind: ebs
    settings:
      zone: us-west-2a
  - name: fast-cinder
    kind: cinder
    capabilities:
      default:
        class: ceph
        performance: medium
      tiers:
        gold:
          class: ceph-nvme
          performance: high
        silver:
          class: ceph
          performance: medium
"#;
        let config = ResolverConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.fallback_policy, FallbackPolicy::BestEffort);
        assert_eq!(config.default_size_bytes().unwrap(), 10 * GIB);
        assert_eq!(config.backends[0].kind, BackendKind::Ebs);

        let registry = config.build_registry().unwrap();
        let cinder = registry.get("fast-cinder").unwrap();
        assert!(cinder.supports(Profile::Gold));
        assert!(!cinder.supports(Profile::Bronze));
    }

    #[test]
    fn test_override_with_inverted_iops_rejected() {
        let yaml = r#"
backends:
  - name: ebs
    kind: ebs
    capabilities:
      default:
        class: standard
        performance: low
      tiers:
        gold:
          class: io1
          performance: high
          iopsPerGib: 1
        bronze:
          class: io1
          performance: high
          iopsPerGib: 100
"#;
        let config = ResolverConfig::from_yaml(yaml).unwrap();
        assert_matches!(
            config.build_registry(),
            Err(Error::CapabilityOrderingViolated { higher: Profile::Gold, lower: Profile::Bronze, .. })
        );
    }

    #[test]
    fn test_missing_sections_use_builtins() {
        let config = ResolverConfig::from_yaml("fallbackPolicy: default\n").unwrap();
        assert_eq!(config.fallback_policy, FallbackPolicy::Default);
        assert_eq!(config.backends, BackendFactory::builtin_entries());
    }

    #[test]
    fn test_invalid_yaml_values() {
        assert_matches!(
            ResolverConfig::from_yaml("fallbackPolicy: downgrade\n"),
            Err(Error::YamlParse(_))
        );
        assert_matches!(
            ResolverConfig::from_yaml("defaultVolumeSize: lots\n"),
            Err(Error::CapacityParse(_))
        );
        assert_matches!(
            ResolverConfig::from_yaml("backends: []\n"),
            Err(Error::Configuration(_))
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fallbackPolicy: reject").unwrap();
        writeln!(file, "backends:").unwrap();
        writeln!(file, "  - name: loop").unwrap();
        writeln!(file, "    kind: loopback").unwrap();

        let config = ResolverConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.backends.len(), 1);
        assert_eq!(config.build_registry().unwrap().names(), vec!["loop"]);
    }

    #[test]
    fn test_load_missing_file() {
        let config = ResolverConfig::load(Some(Path::new("/nonexistent/storage-profiles.yaml")))
            .unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_json_schema() {
        let schema = ResolverConfig::json_schema().unwrap();
        assert!(schema.contains("fallbackPolicy"));
        assert!(schema.contains("best-effort"));
    }
}
