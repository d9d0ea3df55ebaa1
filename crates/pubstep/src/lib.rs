//! # Pubstep
//!
//! The publish step of a release pipeline for npm-compatible registries.
//!
//! Pubstep decides whether a package release should be published at all
//! (dry runs and private packages are skipped without side effects),
//! resolves which authentication mode to use, and performs the registry
//! exchange: existence probe, publish, and an optional follow-up
//! deprecation call. Each request completes before the next begins; there
//! are no internal retries and no rollback once the publish `PUT` is
//! dispatched.
//!
//! The surrounding orchestrator owns everything else — version bumping,
//! tagging, changelog generation, credential acquisition, and packing the
//! tarball into the working directory.
//!
//! ## Flow
//!
//! 1. Skip when `options.commit` is false (dry run) or the manifest is
//!    marked private. Both are successful no-ops.
//! 2. [`RegistryAuth`] resolves the credentials once: bearer token wins
//!    over basic fields; both empty means anonymous.
//! 3. [`RegistryClient`] probes for prior versions (`GET`, 404 is the
//!    normal "new package" path), publishes (`PUT`), and deprecates
//!    (`PUT`) when a reason was supplied.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pubstep::{NullReporter, publish_package};
//! use pubstep_types::{PackageManifest, ReleaseOptions};
//!
//! let manifest = PackageManifest::new("my-pkg", "1.2.3");
//! let options = ReleaseOptions {
//!     commit: true,
//!     npm_token: "some-access-token".to_string(),
//!     ..Default::default()
//! };
//!
//! publish_package(Path::new("."), &manifest, &options, &mut NullReporter)?;
//! # anyhow::Ok(())
//! ```

mod engine;

pub use engine::{NullReporter, Reporter, publish_package};
pub use pubstep_auth::RegistryAuth;
pub use pubstep_registry::RegistryClient;
pub use pubstep_types as types;
