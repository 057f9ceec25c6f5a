//! Provider API keys.
//!
//! Keys live in `secrecy` boxes (zeroed on drop) and format as a fixed
//! placeholder, so a key logged by accident prints nothing useful.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

const REDACTED: &str = "[REDACTED]";

/// An API key or token.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// The raw key. Call only where a request header is built.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretString").field(&REDACTED).finish()
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<&str> for SecretString {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Read a non-empty secret from the environment.
pub fn secret_from_env(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .map(SecretString::new)
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("serper-super-secret");
        assert!(!format!("{:?}", secret).contains("super"));
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_expose_and_clone_keep_value() {
        let secret = SecretString::from("sk-key");
        assert_eq!(secret.expose(), "sk-key");
        assert_eq!(secret.clone().expose(), "sk-key");
    }

    #[test]
    fn test_blank_secret_is_empty() {
        assert!(SecretString::new("  ").is_empty());
    }
}
