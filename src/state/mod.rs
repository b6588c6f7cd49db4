/// State management module
///
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - The filter/search/sort pipeline (query.rs)
/// - The incremental result window (pagination.rs)
/// - The dataset cache with TTL (cache.rs)
/// - Dataset loading and shape normalization (dataset.rs)
/// - Durable per-object annotations (annotations.rs)

pub mod annotations;
pub mod cache;
pub mod data;
pub mod dataset;
pub mod pagination;
pub mod query;
