//! Publish-document construction for the npm wire format.
//!
//! A publish is a single `PUT` of a package document: metadata, a
//! `dist-tags` entry for the released version, the version entry itself,
//! and (when a packed tarball is present in the working directory) a
//! base64 attachment. Packaging the tarball is an external collaborator's
//! job; the working directory is read-only here.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value, json};
use sha1::{Digest, Sha1};

use pubstep_types::PackageManifest;

/// Content type npm registries expect for tarball attachments.
const TARBALL_CONTENT_TYPE: &str = "application/octet-stream";

/// npm-pack style tarball file name for a package version.
///
/// Scoped names are flattened: `@myco/pkg` at `1.2.3` packs to
/// `myco-pkg-1.2.3.tgz`.
pub fn tarball_name(name: &str, version: &str) -> String {
    let flat = name.trim_start_matches('@').replace('/', "-");
    format!("{flat}-{version}.tgz")
}

/// Escape a package name for use as a registry URL path segment.
///
/// Only the scope separator needs escaping: `@myco/pkg` → `@myco%2Fpkg`.
pub fn escaped_name(name: &str) -> String {
    name.replace('/', "%2F")
}

/// Build the document for the publish `PUT`.
///
/// The version entry is the manifest itself plus `_id` and, when the
/// tarball exists at `<working_dir>/<tarball_name>`, a `dist` block with
/// the tarball URL and its SHA-1 shasum. A missing tarball yields a
/// metadata-only document.
pub fn build_publish_document(
    working_dir: &Path,
    manifest: &PackageManifest,
    dist_tag: &str,
    api_base: &str,
) -> Result<Value> {
    let tarball_file = tarball_name(&manifest.name, &manifest.version);
    let tarball = read_tarball(&working_dir.join(&tarball_file))?;

    let mut version_entry = manifest_object(manifest)?;
    version_entry.insert(
        "_id".to_string(),
        json!(format!("{}@{}", manifest.name, manifest.version)),
    );
    if let Some(bytes) = &tarball {
        version_entry.insert(
            "dist".to_string(),
            json!({
                "tarball": format!(
                    "{}/{}/-/{}",
                    api_base.trim_end_matches('/'),
                    escaped_name(&manifest.name),
                    tarball_file
                ),
                "shasum": hex::encode(Sha1::digest(bytes)),
            }),
        );
    }

    let mut doc = Map::new();
    doc.insert("_id".to_string(), json!(manifest.name));
    doc.insert("name".to_string(), json!(manifest.name));
    if let Some(description) = &manifest.description {
        doc.insert("description".to_string(), json!(description));
    }
    let mut dist_tags = Map::new();
    dist_tags.insert(dist_tag.to_string(), json!(manifest.version));
    doc.insert("dist-tags".to_string(), Value::Object(dist_tags));

    let mut versions = Map::new();
    versions.insert(manifest.version.clone(), Value::Object(version_entry));
    doc.insert("versions".to_string(), Value::Object(versions));
    if let Some(bytes) = &tarball {
        doc.insert(
            "_attachments".to_string(),
            json!({
                tarball_file: {
                    "content_type": TARBALL_CONTENT_TYPE,
                    "data": BASE64.encode(bytes),
                    "length": bytes.len(),
                }
            }),
        );
    }

    Ok(Value::Object(doc))
}

/// Build the document for the deprecation `PUT`.
///
/// The version entry carries a `deprecated` marker with the reason; the
/// registry merges it into the stored version metadata.
pub fn build_deprecation_document(manifest: &PackageManifest, reason: &str) -> Result<Value> {
    let mut version_entry = manifest_object(manifest)?;
    version_entry.insert(
        "_id".to_string(),
        json!(format!("{}@{}", manifest.name, manifest.version)),
    );
    version_entry.insert("deprecated".to_string(), json!(reason));

    let mut versions = Map::new();
    versions.insert(manifest.version.clone(), Value::Object(version_entry));

    let mut doc = Map::new();
    doc.insert("_id".to_string(), json!(manifest.name));
    doc.insert("name".to_string(), json!(manifest.name));
    doc.insert("versions".to_string(), Value::Object(versions));
    Ok(Value::Object(doc))
}

fn manifest_object(manifest: &PackageManifest) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(manifest).context("failed to serialize manifest")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("manifest did not serialize to a JSON object"),
    }
}

fn read_tarball(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes =
        fs::read(path).with_context(|| format!("failed to read tarball: {}", path.display()))?;
    Ok(Some(bytes))
}
