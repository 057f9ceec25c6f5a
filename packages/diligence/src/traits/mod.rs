//! Collaborator seams.
//!
//! The pipeline owns the algorithms; everything that talks to the outside
//! world (search providers, language models, web pages, storage) sits
//! behind one of these traits and is injected at construction.

pub mod fetcher;
pub mod llm;
pub mod searcher;
pub mod store;
