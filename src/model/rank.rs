use serde::Serialize;

use super::similarity::SimilarityMatrix;
use crate::catalog::{Catalog, CatalogItem};
use crate::error::{Error, Result};

/// One recommended item and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<'a> {
    /// Row of the item in the catalog
    pub index: usize,
    pub score: f32,
    pub item: &'a CatalogItem,
}

/// Items most similar to a query, best first. Empty when the query title is unknown.
pub type Recommendation<'a> = Vec<Scored<'a>>;

/// Top `n` items most similar to `query_title`, excluding the query itself.
///
/// Scores sort descending; equal scores keep catalog order. A title that is
/// not in the catalog yields an empty recommendation. `n == 0` is rejected.
pub fn recommend<'a>(
    query_title: &str,
    catalog: &'a Catalog,
    similarity: &SimilarityMatrix,
    n: usize,
) -> Result<Recommendation<'a>> {
    if n == 0 {
        return Err(Error::config("n must be positive"));
    }
    let Some(query) = catalog.position(query_title) else {
        return Ok(Vec::new());
    };
    if similarity.size() != catalog.len() {
        return Err(Error::config(format!(
            "similarity matrix has {} rows but catalog has {} items",
            similarity.size(),
            catalog.len()
        )));
    }

    let mut scored: Vec<(usize, f32)> = similarity
        .row(query)
        .iter()
        .copied()
        .enumerate()
        .filter(|&(i, _)| i != query)
        .collect();
    // sort_by is stable: ties stay in catalog order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(n);

    Ok(scored
        .into_iter()
        .map(|(index, score)| Scored {
            index,
            score,
            item: &catalog.items()[index],
        })
        .collect())
}
