//! Content-based recommendations: one text document per catalog item,
//! count or TF-IDF vectors, cosine similarity, and stable top-N ranking.

pub mod catalog;
pub mod config;
pub mod error;
pub mod mcp;
pub mod model;
pub mod poster;

pub use catalog::{Catalog, CatalogItem};
pub use error::{Error, Result};
pub use model::vectorize::Weighting;
pub use model::Model;
