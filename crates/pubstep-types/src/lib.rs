//! Core domain types for pubstep.
//!
//! This crate provides the fundamental types shared across the pubstep
//! ecosystem: the parsed package manifest, the per-release options record,
//! registry configuration, and the result of the registry existence probe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Registry configuration for publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// API base URL (e.g., "https://registry.npmjs.org")
    pub api_base: String,
}

impl Registry {
    /// Create a registry configuration for the given base URL.
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create the npmjs.org registry configuration.
    pub fn npmjs() -> Self {
        Self::new("https://registry.npmjs.org")
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::npmjs()
    }
}

/// Parsed `package.json` of the package being released.
///
/// Only the fields the publish step consults are modeled; everything else
/// is preserved in `other` so the manifest can be embedded verbatim in the
/// publish document. The manifest is a read-only input and is never
/// mutated by the publish step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package name (registry-unique key)
    pub name: String,
    /// Semantic version string
    pub version: String,
    /// Private packages are never published
    #[serde(default, skip_serializing_if = "is_false")]
    pub private: bool,
    /// Package description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `publishConfig` overrides honored by the publish step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_config: Option<PublishConfig>,
    /// All remaining manifest fields, preserved as-is
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    /// Create a minimal manifest with just name and version.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            private: false,
            description: None,
            publish_config: None,
            other: BTreeMap::new(),
        }
    }
}

/// Subset of `publishConfig` the publish step honors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Registry base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// Remaining publishConfig fields, preserved as-is
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

/// Options for a single release invocation.
///
/// Credentials are already resolved by the surrounding orchestrator; this
/// core never reads the environment or config files. Empty credential
/// strings mean "unset".
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Branch the release is being cut from (informational)
    pub current_branch: String,
    /// Registry dist-tag to assign on publish (e.g., "latest")
    pub dist_tag: String,
    /// True for a real run; false means dry run with zero side effects
    pub commit: bool,
    /// Basic-auth username (empty if unused)
    pub npm_username: String,
    /// Basic-auth password, base64-encoded (empty if unused)
    pub npm_password_base64: String,
    /// Basic-auth email (empty if unused)
    pub npm_email: String,
    /// Bearer token (empty if unused; takes precedence over basic auth)
    pub npm_token: String,
    /// Human-readable deprecation reason; presence triggers a follow-up
    /// deprecation call after a successful publish
    pub deprecated: Option<String>,
    /// Registry to publish to
    pub registry: Registry,
}

impl ReleaseOptions {
    /// The deprecation reason, if one was supplied.
    ///
    /// An empty string counts as "not set".
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.deprecated
            .as_deref()
            .filter(|reason| !reason.is_empty())
    }
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            current_branch: "main".to_string(),
            dist_tag: "latest".to_string(),
            commit: false,
            npm_username: String::new(),
            npm_password_base64: String::new(),
            npm_email: String::new(),
            npm_token: String::new(),
            deprecated: None,
            registry: Registry::default(),
        }
    }
}

/// Outcome of the registry existence probe.
///
/// A structured 404 is normal-path information ("new package"), not an
/// error. The probe never blocks publication by itself; the registry is
/// the authority on version conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    /// The registry does not know the package yet (404)
    NotFound,
    /// The package exists; previously published versions
    Exists { versions: Vec<String> },
}

impl ProbeResult {
    /// Whether the given version was already published.
    pub fn has_version(&self, version: &str) -> bool {
        match self {
            ProbeResult::NotFound => false,
            ProbeResult::Exists { versions } => versions.iter().any(|v| v == version),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npmjs_registry_defaults_are_expected() {
        let reg = Registry::npmjs();
        assert_eq!(reg.api_base, "https://registry.npmjs.org");
        assert_eq!(Registry::default(), reg);
    }

    #[test]
    fn registry_trims_trailing_slash() {
        let reg = Registry::new("http://127.0.0.1:3000/");
        assert_eq!(reg.api_base, "http://127.0.0.1:3000");
    }

    #[test]
    fn manifest_private_defaults_to_false() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"name":"pkg","version":"1.0.0"}"#).expect("parse");
        assert!(!manifest.private);
    }

    #[test]
    fn manifest_preserves_unknown_fields() {
        let json = r#"{
            "name": "pkg",
            "version": "1.0.0",
            "license": "MIT",
            "publishConfig": { "registry": "http://registry.example.com", "access": "public" },
            "dependencies": { "lodash": "^4.0.0" }
        }"#;
        let manifest: PackageManifest = serde_json::from_str(json).expect("parse");

        assert_eq!(manifest.name, "pkg");
        let publish_config = manifest.publish_config.as_ref().expect("publishConfig");
        assert_eq!(
            publish_config.registry.as_deref(),
            Some("http://registry.example.com")
        );
        assert!(publish_config.other.contains_key("access"));
        assert!(manifest.other.contains_key("license"));
        assert!(manifest.other.contains_key("dependencies"));

        let back = serde_json::to_value(&manifest).expect("serialize");
        assert_eq!(back["license"], "MIT");
        assert_eq!(back["dependencies"]["lodash"], "^4.0.0");
        // private=false stays implicit, as in the source manifest
        assert!(back.get("private").is_none());
    }

    #[test]
    fn manifest_private_roundtrips_when_set() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"name":"pkg","version":"1.0.0","private":true}"#)
                .expect("parse");
        assert!(manifest.private);

        let back = serde_json::to_value(&manifest).expect("serialize");
        assert_eq!(back["private"], true);
    }

    #[test]
    fn deprecation_reason_filters_empty_string() {
        let mut options = ReleaseOptions::default();
        assert_eq!(options.deprecation_reason(), None);

        options.deprecated = Some(String::new());
        assert_eq!(options.deprecation_reason(), None);

        options.deprecated = Some("superseded".to_string());
        assert_eq!(options.deprecation_reason(), Some("superseded"));
    }

    #[test]
    fn probe_result_version_lookup() {
        assert!(!ProbeResult::NotFound.has_version("1.0.0"));

        let exists = ProbeResult::Exists {
            versions: vec!["0.9.0".to_string(), "1.0.0".to_string()],
        };
        assert!(exists.has_version("1.0.0"));
        assert!(!exists.has_version("2.0.0"));
    }
}
