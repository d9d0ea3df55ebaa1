//! Authentication-mode resolution for pubstep.
//!
//! The credentials supplied in [`ReleaseOptions`] are collapsed into a
//! single [`RegistryAuth`] value once per invocation, and every outgoing
//! registry request consumes that value uniformly. Resolution is pure:
//! no environment lookups, no file reads, no network.
//!
//! # Example
//!
//! ```
//! use pubstep_auth::RegistryAuth;
//! use pubstep_types::ReleaseOptions;
//!
//! let options = ReleaseOptions {
//!     npm_token: "some-access-token".to_string(),
//!     ..Default::default()
//! };
//!
//! let auth = RegistryAuth::resolve(&options).expect("resolve");
//! assert_eq!(
//!     auth.header_value().as_deref(),
//!     Some("Bearer some-access-token")
//! );
//! ```

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use pubstep_types::ReleaseOptions;

/// Authentication mode for registry requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic <credentials>`, where `credentials` is
    /// `base64(username:password)` with the password already decoded from
    /// its base64 input form.
    Basic { credentials: String },
    /// No `Authorization` header. The registry will reject the request if
    /// it requires auth; that outcome propagates as a normal HTTP error.
    Anonymous,
}

impl RegistryAuth {
    /// Resolve the auth mode from release options.
    ///
    /// A non-empty token wins silently; the basic-auth fields are only
    /// consulted when the token is empty. This precedence matches the
    /// original options contract and is not treated as a configuration
    /// error.
    pub fn resolve(options: &ReleaseOptions) -> Result<Self> {
        if !options.npm_token.is_empty() {
            return Ok(RegistryAuth::Bearer(options.npm_token.clone()));
        }

        if !options.npm_username.is_empty() && !options.npm_password_base64.is_empty() {
            let password = decode_password(&options.npm_password_base64)?;
            let credentials =
                BASE64.encode(format!("{}:{}", options.npm_username, password));
            return Ok(RegistryAuth::Basic { credentials });
        }

        Ok(RegistryAuth::Anonymous)
    }

    /// Render the `Authorization` header value, if any.
    pub fn header_value(&self) -> Option<String> {
        match self {
            RegistryAuth::Bearer(token) => Some(format!("Bearer {token}")),
            RegistryAuth::Basic { credentials } => Some(format!("Basic {credentials}")),
            RegistryAuth::Anonymous => None,
        }
    }

    /// Short human-readable name of the auth mode, for progress reporting.
    pub fn describe(&self) -> &'static str {
        match self {
            RegistryAuth::Bearer(_) => "bearer token",
            RegistryAuth::Basic { .. } => "basic credentials",
            RegistryAuth::Anonymous => "anonymous",
        }
    }

    /// Whether requests will be sent without an `Authorization` header.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, RegistryAuth::Anonymous)
    }
}

fn decode_password(encoded: &str) -> Result<String> {
    let bytes = BASE64
        .decode(encoded)
        .context("npm password is not valid base64")?;
    String::from_utf8(bytes).context("decoded npm password is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn basic_options(username: &str, password: &str) -> ReleaseOptions {
        ReleaseOptions {
            npm_username: username.to_string(),
            npm_password_base64: BASE64.encode(password),
            npm_email: format!("{username}@example.com"),
            ..Default::default()
        }
    }

    #[test]
    fn empty_credentials_resolve_to_anonymous() {
        let auth = RegistryAuth::resolve(&ReleaseOptions::default()).expect("resolve");
        assert_eq!(auth, RegistryAuth::Anonymous);
        assert!(auth.is_anonymous());
        assert_eq!(auth.header_value(), None);
    }

    #[test]
    fn token_resolves_to_bearer() {
        let options = ReleaseOptions {
            npm_token: "some-access-token".to_string(),
            ..Default::default()
        };

        let auth = RegistryAuth::resolve(&options).expect("resolve");
        assert_eq!(auth, RegistryAuth::Bearer("some-access-token".to_string()));
        assert_eq!(
            auth.header_value().as_deref(),
            Some("Bearer some-access-token")
        );
    }

    #[test]
    fn username_and_password_resolve_to_basic() {
        let auth = RegistryAuth::resolve(&basic_options("robin", "passw0rd")).expect("resolve");

        let expected = BASE64.encode("robin:passw0rd");
        assert_eq!(
            auth,
            RegistryAuth::Basic {
                credentials: expected.clone()
            }
        );
        assert_eq!(auth.header_value(), Some(format!("Basic {expected}")));
    }

    #[test]
    fn token_wins_over_basic_fields() {
        let mut options = basic_options("robin", "passw0rd");
        options.npm_token = "tok".to_string();

        let auth = RegistryAuth::resolve(&options).expect("resolve");
        assert_eq!(auth, RegistryAuth::Bearer("tok".to_string()));
    }

    #[test]
    fn username_without_password_is_anonymous() {
        let options = ReleaseOptions {
            npm_username: "robin".to_string(),
            ..Default::default()
        };

        let auth = RegistryAuth::resolve(&options).expect("resolve");
        assert_eq!(auth, RegistryAuth::Anonymous);
    }

    #[test]
    fn malformed_password_base64_is_an_error() {
        let options = ReleaseOptions {
            npm_username: "robin".to_string(),
            npm_password_base64: "not base64!!".to_string(),
            ..Default::default()
        };

        let err = RegistryAuth::resolve(&options).expect_err("should fail");
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn describe_names_each_mode() {
        assert_eq!(
            RegistryAuth::Bearer("t".to_string()).describe(),
            "bearer token"
        );
        assert_eq!(
            RegistryAuth::Basic {
                credentials: "c".to_string()
            }
            .describe(),
            "basic credentials"
        );
        assert_eq!(RegistryAuth::Anonymous.describe(), "anonymous");
    }

    proptest! {
        #[test]
        fn token_always_wins(
            token in "[A-Za-z0-9_-]{1,40}",
            username in ".{0,16}",
            password_base64 in ".{0,24}",
        ) {
            let options = ReleaseOptions {
                npm_token: token.clone(),
                npm_username: username,
                npm_password_base64: password_base64,
                ..Default::default()
            };

            // The malformed-password path is unreachable while a token is set.
            let auth = RegistryAuth::resolve(&options).expect("resolve");
            prop_assert_eq!(auth, RegistryAuth::Bearer(token));
        }

        #[test]
        fn basic_credentials_roundtrip(
            username in "[a-z][a-z0-9]{0,11}",
            password in "[ -~]{0,24}",
        ) {
            let auth = RegistryAuth::resolve(&basic_options(&username, &password))
                .expect("resolve");

            let RegistryAuth::Basic { credentials } = auth else {
                return Err(TestCaseError::fail("expected basic auth"));
            };
            let decoded = BASE64.decode(&credentials).expect("decode");
            let decoded = String::from_utf8(decoded).expect("utf8");
            prop_assert_eq!(decoded, format!("{}:{}", username, password));
        }
    }
}
