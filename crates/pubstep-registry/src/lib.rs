//! Registry API client for pubstep.
//!
//! This crate performs the HTTP exchanges of the publish step against an
//! npm-compatible registry: the existence probe (`GET /<name>`), the
//! publish request (`PUT /<name>`), and the optional deprecation request
//! (a second `PUT /<name>`). Requests are strictly sequential; the client
//! holds no state beyond the registry configuration.
//!
//! # Example
//!
//! ```no_run
//! use pubstep_registry::RegistryClient;
//! use pubstep_types::{ProbeResult, Registry};
//!
//! let client = RegistryClient::new(Registry::npmjs())?;
//! match client.probe("left-pad")? {
//!     ProbeResult::NotFound => println!("new package"),
//!     ProbeResult::Exists { versions } => println!("{} versions", versions.len()),
//! }
//! # anyhow::Ok(())
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use pubstep_auth::RegistryAuth;
use pubstep_types::{PackageManifest, ProbeResult, Registry};

mod document;

pub use document::{build_deprecation_document, build_publish_document, escaped_name, tarball_name};

/// Default user agent for registry requests
pub const USER_AGENT: &str = concat!("pubstep/", env!("CARGO_PKG_VERSION"));

/// HTTP client for a single npm-compatible registry.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    registry: Registry,
    http: Client,
}

impl RegistryClient {
    /// Create a client for the given registry.
    pub fn new(registry: Registry) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { registry, http })
    }

    /// The registry this client talks to.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn package_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.registry.api_base.trim_end_matches('/'),
            escaped_name(name)
        )
    }

    /// Probe the registry for prior versions of a package.
    ///
    /// A structured 404 means the package is new and is not an error. Any
    /// other non-200 status (registry unavailable, permission failure)
    /// propagates, as do transport errors.
    pub fn probe(&self, name: &str) -> Result<ProbeResult> {
        let resp = self
            .http
            .get(self.package_url(name))
            .send()
            .context("registry probe request failed")?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(ProbeResult::NotFound),
            StatusCode::OK => {
                let doc: PackageDocument = resp
                    .json()
                    .context("failed to parse registry package document")?;
                Ok(ProbeResult::Exists {
                    versions: doc.versions.into_keys().collect(),
                })
            }
            s => bail!("unexpected status while probing package {name}: {s}"),
        }
    }

    /// Publish a package version.
    ///
    /// Builds the publish document from the manifest and the working
    /// directory (tarball resolved read-only, see
    /// [`build_publish_document`]) and issues the `PUT`. Any non-2xx
    /// response rejects with the registry's error payload in the message.
    pub fn publish(
        &self,
        working_dir: &Path,
        manifest: &PackageManifest,
        dist_tag: &str,
        auth: &RegistryAuth,
    ) -> Result<()> {
        let document = document::build_publish_document(
            working_dir,
            manifest,
            dist_tag,
            &self.registry.api_base,
        )?;
        self.put_document(&manifest.name, &document, auth)
            .with_context(|| {
                format!("failed to publish {}@{}", manifest.name, manifest.version)
            })
    }

    /// Mark a published version as deprecated with a human-readable reason.
    ///
    /// Issued with the same auth as the publish; only called after the
    /// publish `PUT` succeeded.
    pub fn deprecate(
        &self,
        manifest: &PackageManifest,
        reason: &str,
        auth: &RegistryAuth,
    ) -> Result<()> {
        let document = document::build_deprecation_document(manifest, reason)?;
        self.put_document(&manifest.name, &document, auth)
            .with_context(|| {
                format!("failed to deprecate {}@{}", manifest.name, manifest.version)
            })
    }

    fn put_document(
        &self,
        name: &str,
        document: &serde_json::Value,
        auth: &RegistryAuth,
    ) -> Result<()> {
        let mut request = self.http.put(self.package_url(name)).json(document);
        if let Some(header) = auth.header_value() {
            request = request.header("Authorization", header);
        }

        let resp = request.send().context("registry request failed")?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        bail!(
            "registry rejected request with status {status}: {}",
            registry_error_message(resp)
        );
    }
}

/// Minimal slice of the registry package document: only the `versions`
/// mapping is interpreted.
#[derive(Debug, Deserialize)]
struct PackageDocument {
    #[serde(default)]
    versions: BTreeMap<String, serde_json::Value>,
}

/// Error payload shape used by npm registries.
#[derive(Debug, Deserialize)]
struct RegistryError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
}

fn registry_error_message(resp: reqwest::blocking::Response) -> String {
    let body = resp.text().unwrap_or_default();
    if let Ok(err) = serde_json::from_str::<RegistryError>(&body) {
        if !err.error.is_empty() {
            return err.error;
        }
        if !err.reason.is_empty() {
            return err.reason;
        }
    }
    if body.is_empty() {
        "<empty body>".to_string()
    } else {
        body
    }
}
