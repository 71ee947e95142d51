//! SASL credentials.

use bytes::Bytes;
use std::fmt;

/// Authentication credentials, one case per supported mechanism.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// PLAIN: username and password.
    Plain { username: String, password: String },
    /// EXTERNAL: identity taken from the transport (client certificate);
    /// the identity string may be empty to let the server derive it.
    External { identity: String },
}

impl Credentials {
    pub fn plain(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Plain {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn external(identity: impl Into<String>) -> Self {
        Credentials::External {
            identity: identity.into(),
        }
    }

    /// The mechanism name sent in `connection.start-ok`.
    pub fn mechanism(&self) -> &'static str {
        match self {
            Credentials::Plain { .. } => "PLAIN",
            Credentials::External { .. } => "EXTERNAL",
        }
    }

    /// The mechanism-specific response blob.
    pub fn response(&self) -> Bytes {
        match self {
            Credentials::Plain { username, password } => {
                let mut blob = Vec::with_capacity(2 + username.len() + password.len());
                blob.push(0);
                blob.extend_from_slice(username.as_bytes());
                blob.push(0);
                blob.extend_from_slice(password.as_bytes());
                Bytes::from(blob)
            }
            Credentials::External { identity } => Bytes::from(identity.clone().into_bytes()),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials::plain("guest", "guest")
    }
}

// Manual Debug so the password never lands in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Plain { username, .. } => f
                .debug_struct("Plain")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::External { identity } => f
                .debug_struct("External")
                .field("identity", identity)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_response_blob() {
        let creds = Credentials::plain("guest", "secret");
        assert_eq!(creds.mechanism(), "PLAIN");
        assert_eq!(creds.response().as_ref(), b"\x00guest\x00secret");
    }

    #[test]
    fn test_external_response_blob() {
        let creds = Credentials::external("svc");
        assert_eq!(creds.mechanism(), "EXTERNAL");
        assert_eq!(creds.response().as_ref(), b"svc");

        let empty = Credentials::external("");
        assert!(empty.response().is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::plain("guest", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("guest"));
    }
}
