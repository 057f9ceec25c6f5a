//! Security utilities for credential handling and URL validation.

pub mod credentials;
pub mod url_validator;

pub use credentials::{secret_from_env, SecretString};
pub use url_validator::UrlValidator;
