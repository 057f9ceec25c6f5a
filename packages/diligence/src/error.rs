//! Typed errors for the diligence library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Only [`PipelineError`]
//! ever reaches a caller of [`crate::Pipeline::run`]; every other error is
//! absorbed by the component that observed it.

use std::time::Duration;

use thiserror::Error;

/// Errors from a single call to the search collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider answered with a non-success status
    #[error("search provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON shape
    #[error("could not decode search response: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Per-call deadline elapsed
    #[error("search timed out after {elapsed:?}: {query}")]
    Timeout { query: String, elapsed: Duration },

    /// Call was dropped before producing a result
    #[error("search task aborted: {0}")]
    Aborted(String),
}

/// Errors from the optional page fetch used to enrich evidence.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Security validation failed
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success status
    #[error("fetch of {url} returned {status}")]
    Status { url: String, status: u16 },

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Page had no usable text after cleaning
    #[error("no text content at: {url}")]
    Empty { url: String },
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, metadata endpoints)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Host did not resolve
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),
}

/// Errors from the language-model collaborator.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No model is configured (e.g. missing API key)
    #[error("language model not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure
    #[error("language model unreachable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider answered with a non-success status
    #[error("language model returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider answered without any completion text
    #[error("language model returned no content")]
    EmptyResponse,
}

/// Errors from a structured extraction attempt.
///
/// Both variants are recoverable: the extractor answers them by switching
/// to the deterministic pattern strategy.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Extraction collaborator down, misconfigured, or refusing requests
    #[error("extraction unavailable: {0}")]
    Unavailable(#[from] LlmError),

    /// Response could not be parsed, even after truncation recovery
    #[error("malformed extraction response: {reason}")]
    MalformedResponse { reason: String },
}

/// Errors from the persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that surface from a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The final write failed; previously persisted versions are untouched
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    /// Configuration rejected before any work started
    #[error("config error: {reason}")]
    Config { reason: String },
}

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Result type alias for page fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for security operations.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;

/// Result type alias for language-model calls.
pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Result type alias for extraction attempts.
pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for pipeline runs.
pub type Result<T> = std::result::Result<T, PipelineError>;
