//! Metadata-filtered similarity search with configurable fallback

mod search;

pub use search::{Retriever, SearchFallback};
