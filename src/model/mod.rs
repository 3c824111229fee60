pub mod rank;
pub mod similarity;
pub mod stopwords;
pub mod vectorize;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::catalog::document::build_documents;
use crate::catalog::loader::{fingerprint_file, load_catalog};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::Result;
use rank::Recommendation;
use similarity::SimilarityMatrix;
use vectorize::{FeatureVector, Vectorizer, Vocabulary, Weighting};

/// Summary of a built model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub items: usize,
    pub vocabulary_size: usize,
    pub nonzero_entries: usize,
    pub weighting: Weighting,
    /// BLAKE3 of the dataset file, when the catalog came from disk
    pub dataset_fingerprint: Option<String>,
    pub built_at: DateTime<Utc>,
    pub build_millis: u128,
}

/// Vocabulary, vectors and similarity matrix for one catalog. Built once,
/// read-only afterwards, safe to share across threads.
#[derive(Debug)]
pub struct Model {
    catalog: Catalog,
    vocabulary: Vocabulary,
    vectors: Vec<FeatureVector>,
    similarity: SimilarityMatrix,
    stats: ModelStats,
}

impl Model {
    /// Build from an in-memory catalog.
    pub fn build(catalog: Catalog, weighting: Weighting, threads: usize) -> Self {
        let started = Instant::now();

        let documents = build_documents(&catalog);
        let (vocabulary, vectors) = Vectorizer::new(weighting).fit_transform(&documents);
        debug!(
            documents = documents.len(),
            vocabulary = vocabulary.len(),
            %weighting,
            "vocabulary fitted"
        );

        let similarity = SimilarityMatrix::compute_with_threads(&vectors, threads);
        let elapsed = started.elapsed();
        info!(
            items = catalog.len(),
            threads,
            elapsed_ms = elapsed.as_millis() as u64,
            "similarity matrix computed"
        );

        let stats = ModelStats {
            items: catalog.len(),
            vocabulary_size: vocabulary.len(),
            nonzero_entries: vectors.iter().map(FeatureVector::nnz).sum(),
            weighting,
            dataset_fingerprint: None,
            built_at: Utc::now(),
            build_millis: elapsed.as_millis(),
        };

        Self {
            catalog,
            vocabulary,
            vectors,
            similarity,
            stats,
        }
    }

    /// Load the configured dataset and build the model from it.
    pub fn from_config(project_root: &Path, config: &Config) -> Result<Self> {
        let weighting = config.weighting()?;
        let path = config.dataset_path(project_root);
        let catalog = load_catalog(&path, &config.dataset.columns)?;
        info!(items = catalog.len(), path = %path.display(), "catalog loaded");
        let fingerprint = fingerprint_file(&path)?;

        let mut model = Self::build(catalog, weighting, config.effective_threads());
        model.stats.dataset_fingerprint = Some(fingerprint);
        Ok(model)
    }

    /// Top `n` items similar to `title`. Unknown titles give an empty result.
    pub fn recommend(&self, title: &str, n: usize) -> Result<Recommendation<'_>> {
        rank::recommend(title, &self.catalog, &self.similarity, n)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn stats(&self) -> &ModelStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use crate::error::Error;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new("A", "crime drama"),
            CatalogItem::new("B", "crime thriller"),
            CatalogItem::new("C", "romance comedy"),
        ])
    }

    #[test]
    fn shared_token_ranks_first() {
        for weighting in [Weighting::Count, Weighting::TfIdf] {
            let model = Model::build(catalog(), weighting, 1);
            let rec = model.recommend("A", 2).unwrap();
            let titles: Vec<&str> = rec.iter().map(|s| s.item.title.as_str()).collect();
            assert_eq!(titles, vec!["B", "C"], "{weighting}");
            assert!(rec[0].score > rec[1].score);
        }
    }

    #[test]
    fn stats_describe_the_build() {
        let model = Model::build(catalog(), Weighting::Count, 2);
        let stats = model.stats();
        assert_eq!(stats.items, 3);
        assert_eq!(stats.vocabulary_size, 5);
        assert_eq!(stats.nonzero_entries, 6);
        assert_eq!(stats.weighting, Weighting::Count);
        assert!(stats.dataset_fingerprint.is_none());
        assert_eq!(model.vectors().len(), 3);
        assert_eq!(model.similarity().size(), 3);
    }

    #[test]
    fn independent_models_coexist() {
        let count = Model::build(catalog(), Weighting::Count, 1);
        let tfidf = Model::build(catalog(), Weighting::TfIdf, 1);
        let a = count.recommend("A", 1).unwrap()[0].score;
        let b = tfidf.recommend("A", 1).unwrap()[0].score;
        assert!((a - 0.5).abs() < 1e-6);
        assert!(b < a);
    }

    #[test]
    fn from_config_reads_dataset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("imdb_top_1000.csv"),
            "Poster_Link,Series_Title,Genre,IMDB_Rating,Overview,Director,Star1,Star2\n\
             ,A,Crime,9.0,mob family,X,P,Q\n\
             ,B,Crime,8.0,mob boss,Y,R,S\n",
        )
        .unwrap();
        let model = Model::from_config(dir.path(), &Config::default()).unwrap();
        assert_eq!(model.catalog().len(), 2);
        assert_eq!(model.stats().dataset_fingerprint.as_ref().map(String::len), Some(64));
        assert_eq!(model.recommend("A", 5).unwrap().len(), 1);
    }

    #[test]
    fn from_config_rejects_unknown_weighting() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.model.weighting = "bm25".into();
        assert!(matches!(Model::from_config(dir.path(), &config), Err(Error::Config(_))));
    }

    #[test]
    fn model_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Model>();
    }
}
