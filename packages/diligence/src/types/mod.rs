//! Data types shared across the pipeline.

pub mod candidate;
pub mod completeness;
pub mod config;
pub mod entity;
pub mod evidence;
pub mod field;
pub mod hit;
pub mod query;
pub mod records;
