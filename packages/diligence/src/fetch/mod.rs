//! Page fetchers used to enrich the leading evidence candidates.

pub mod http;
pub mod validated;

pub use http::HttpPageFetcher;
pub use validated::ValidatedFetcher;
