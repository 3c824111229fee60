use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::stopwords::is_stop_word;
use crate::error::Error;

/// Runs of two or more word characters.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// How token occurrences become feature weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    /// Term frequency within the document.
    Count,
    /// Term frequency scaled by `ln((1 + N) / (1 + df)) + 1`.
    TfIdf,
}

impl Weighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weighting::Count => "count",
            Weighting::TfIdf => "tfidf",
        }
    }
}

impl FromStr for Weighting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" | "raw_count" => Ok(Weighting::Count),
            "tfidf" | "tf-idf" => Ok(Weighting::TfIdf),
            other => Err(Error::config(format!(
                "unknown weighting mode {other:?} (expected \"count\" or \"tfidf\")"
            ))),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase, extract word tokens, drop stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// Token to column mapping learned at fit time. Columns follow lexicographic
/// token order.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    columns: BTreeMap<String, usize>,
    idf: Vec<f32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, token: &str) -> Option<usize> {
        self.columns.get(token).copied()
    }

    /// Tokens in column order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Smoothed inverse document frequency of a column.
    pub fn idf(&self, column: usize) -> f32 {
        self.idf.get(column).copied().unwrap_or(0.0)
    }
}

/// Sparse document vector: `(column, weight)` pairs sorted by column, zero
/// weights omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(usize, f32)>,
}

impl FeatureVector {
    pub fn from_entries(mut entries: Vec<(usize, f32)>) -> Self {
        entries.retain(|&(_, w)| w != 0.0);
        entries.sort_by_key(|&(c, _)| c);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f32)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn weight(&self, column: usize) -> f32 {
        self.entries
            .binary_search_by_key(&column, |&(c, _)| c)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product as a merge over both sorted column lists.
    pub fn dot(&self, other: &FeatureVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

pub struct Vectorizer {
    weighting: Weighting,
}

impl Vectorizer {
    pub fn new(weighting: Weighting) -> Self {
        Self { weighting }
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Learn the vocabulary from `documents`, then vectorize the same documents.
    pub fn fit_transform(&self, documents: &[String]) -> (Vocabulary, Vec<FeatureVector>) {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        let distinct: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let columns: BTreeMap<String, usize> = distinct
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        let mut doc_freq = vec![0usize; columns.len()];
        for tokens in &tokenized {
            let unique: BTreeSet<usize> = tokens.iter().filter_map(|t| columns.get(t).copied()).collect();
            for c in unique {
                doc_freq[c] += 1;
            }
        }

        let n = documents.len() as f32;
        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let vocabulary = Vocabulary { columns, idf };
        let vectors = tokenized
            .iter()
            .map(|tokens| self.weigh(&vocabulary, tokens))
            .collect();
        (vocabulary, vectors)
    }

    /// Vectorize one document against a fitted vocabulary; unseen tokens are dropped.
    pub fn transform(&self, vocabulary: &Vocabulary, document: &str) -> FeatureVector {
        self.weigh(vocabulary, &tokenize(document))
    }

    fn weigh(&self, vocabulary: &Vocabulary, tokens: &[String]) -> FeatureVector {
        let mut tf: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(c) = vocabulary.column(token) {
                *tf.entry(c).or_insert(0.0) += 1.0;
            }
        }
        let entries = tf
            .into_iter()
            .map(|(c, count)| match self.weighting {
                Weighting::Count => (c, count),
                Weighting::TfIdf => (c, count * vocabulary.idf(c)),
            })
            .collect();
        FeatureVector::from_entries(entries)
    }
}
