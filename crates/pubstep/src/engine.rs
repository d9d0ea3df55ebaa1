use std::path::Path;

use anyhow::{Context, Result};

use pubstep_auth::RegistryAuth;
use pubstep_registry::RegistryClient;
use pubstep_types::{PackageManifest, ProbeResult, Registry, ReleaseOptions};

/// Sink for human-readable progress messages.
///
/// Presentation (stdout, progress bars, log files) is owned by the
/// caller; the engine only describes what it is doing.
pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Reporter that discards every message.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn info(&mut self, _msg: &str) {}
    fn warn(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

/// Publish a package release to its registry.
///
/// Completes successfully having done nothing when `options.commit` is
/// false (dry run) or the manifest is marked private — both suppress every
/// registry request, including deprecation. Otherwise the engine resolves
/// the auth mode, probes the registry for prior versions, issues the
/// publish `PUT` under `options.dist_tag`, and, when a deprecation reason
/// is set, a follow-up deprecation `PUT` with the same auth.
///
/// The working directory and manifest are read-only inputs; the only side
/// effects are the registry requests. Every failure — transport errors,
/// non-404 probe responses, non-2xx publish or deprecation responses —
/// surfaces to the caller; nothing is retried or swallowed.
pub fn publish_package(
    working_dir: &Path,
    manifest: &PackageManifest,
    options: &ReleaseOptions,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    if !options.commit {
        reporter.info(&format!(
            "dry run, skipping publish of {}@{}",
            manifest.name, manifest.version
        ));
        return Ok(());
    }

    if manifest.private {
        reporter.info(&format!(
            "{} is marked private, skipping publish",
            manifest.name
        ));
        return Ok(());
    }

    let auth = RegistryAuth::resolve(options)?;
    let client = RegistryClient::new(effective_registry(manifest, options))?;
    reporter.info(&format!(
        "publishing {}@{} to {} ({})",
        manifest.name,
        manifest.version,
        client.registry().api_base,
        auth.describe()
    ));

    match client
        .probe(&manifest.name)
        .with_context(|| format!("registry probe failed for {}", manifest.name))?
    {
        ProbeResult::NotFound => {
            reporter.info(&format!(
                "{} has no prior versions on the registry",
                manifest.name
            ));
        }
        ProbeResult::Exists { versions } => {
            if versions.iter().any(|v| v == &manifest.version) {
                reporter.warn(&format!(
                    "{}@{} already exists on the registry",
                    manifest.name, manifest.version
                ));
            }
            reporter.info(&format!(
                "{} has {} published version(s)",
                manifest.name,
                versions.len()
            ));
        }
    }

    client.publish(working_dir, manifest, &options.dist_tag, &auth)?;
    reporter.info(&format!(
        "published {}@{} with dist-tag {}",
        manifest.name, manifest.version, options.dist_tag
    ));

    if let Some(reason) = options.deprecation_reason() {
        client.deprecate(manifest, reason, &auth)?;
        reporter.warn(&format!(
            "deprecated {}@{}: {}",
            manifest.name, manifest.version, reason
        ));
    }

    Ok(())
}

/// Registry to publish to: `publishConfig.registry` from the manifest
/// overrides the one supplied in the options.
fn effective_registry(manifest: &PackageManifest, options: &ReleaseOptions) -> Registry {
    if let Some(config) = &manifest.publish_config
        && let Some(url) = &config.registry
    {
        return Registry::new(url);
    }
    options.registry.clone()
}
