//! Search backends.
//!
//! - [`SerperSearcher`] - Google results through Serper, with the
//!   knowledge-graph panel.
//! - [`TavilySearcher`] - Tavily search API.
//! - [`RateLimitedSearcher`] - quota wrapper for either.

pub mod rate_limited;
pub mod serper;
pub mod tavily;

pub use rate_limited::{RateLimitedSearcher, WebSearcherExt};
pub use serper::SerperSearcher;
pub use tavily::TavilySearcher;
