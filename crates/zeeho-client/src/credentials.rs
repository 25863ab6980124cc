//! Credential bundle captured from the official app

use std::fmt;

/// The six opaque strings needed to sign requests
///
/// Read-only once built. `Debug` redacts the secret-bearing fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    authorization: String,
    cfmoto_x_sign: String,
    app_id: String,
    nonce: String,
    signature: String,
    user_agent: String,
}

impl Credentials {
    pub fn new(
        authorization: impl Into<String>,
        cfmoto_x_sign: impl Into<String>,
        app_id: impl Into<String>,
        nonce: impl Into<String>,
        signature: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            authorization: authorization.into(),
            cfmoto_x_sign: cfmoto_x_sign.into(),
            app_id: app_id.into(),
            nonce: nonce.into(),
            signature: signature.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn cfmoto_x_sign(&self) -> &str {
        &self.cfmoto_x_sign
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Names of fields that are empty or whitespace
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("authorization", &self.authorization),
            ("cfmoto_x_sign", &self.cfmoto_x_sign),
            ("app_id", &self.app_id),
            ("nonce", &self.nonce),
            ("signature", &self.signature),
            ("user_agent", &self.user_agent),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("authorization", &redact(&self.authorization))
            .field("cfmoto_x_sign", &redact(&self.cfmoto_x_sign))
            .field("app_id", &self.app_id)
            .field("nonce", &self.nonce)
            .field("signature", &redact(&self.signature))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("Bearer abc", "sign-xyz", "app1", "n1", "sig-123", "ua");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("abc"));
        assert!(!debug.contains("sign-xyz"));
        assert!(!debug.contains("sig-123"));
        assert!(debug.contains("app1"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_accessors() {
        let creds = Credentials::new("Bearer abc", "sign-xyz", "app1", "n1", "sig-123", "ua");
        assert_eq!(creds.authorization(), "Bearer abc");
        assert_eq!(creds.cfmoto_x_sign(), "sign-xyz");
        assert_eq!(creds.app_id(), "app1");
        assert_eq!(creds.nonce(), "n1");
        assert_eq!(creds.signature(), "sig-123");
        assert_eq!(creds.user_agent(), "ua");
    }

    #[test]
    fn test_missing_fields() {
        let creds = Credentials::new("a", " ", "c", "", "e", "f");
        assert_eq!(creds.missing_fields(), vec!["cfmoto_x_sign", "nonce"]);
        assert!(Credentials::new("a", "b", "c", "d", "e", "f")
            .missing_fields()
            .is_empty());
    }
}
