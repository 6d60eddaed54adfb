//! TF-IDF vector space fitted on a corpus of short documents.
//!
//! Tokens: lowercase runs of two or more word characters.
//! Weights: raw term count × smoothed idf, `ln((1 + n) / (1 + df)) + 1`, then L2-normalized.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| {
        Regex::new(r"\b\w\w+\b").expect("Static regex pattern is guaranteed to be valid")
    })
}

pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Term index → weight. Terms outside the fitted vocabulary are simply absent.
/// Ordered by term index so identical documents sum in the same order and
/// produce bit-identical scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<usize, f64>,
}

impl SparseVector {
    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        // Iterate the shorter side.
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .weights
            .iter()
            .filter_map(|(term, w)| large.weights.get(term).map(|v| w * v))
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfModel {
    /// Builds vocabulary and idf weights from `documents` only.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term.to_string(), index))
            .collect();

        let mut document_frequency = vec![0_usize; vocabulary.len()];
        for tokens in &tokenized {
            let distinct: BTreeSet<usize> = tokens.iter().map(|t| vocabulary[t]).collect();
            for index in distinct {
                document_frequency[index] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = document_frequency
            .into_iter()
            .map(|df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        TfidfModel { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Projects a document into the fitted space as an L2-normalized vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(document) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *weights.entry(index).or_insert(0.0) += 1.0;
            }
        }
        for (index, weight) in weights.iter_mut() {
            *weight *= self.idf[*index];
        }

        let mut vector = SparseVector { weights };
        let norm = vector.norm();
        if norm > 0.0 {
            for weight in vector.weights.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Cosine of the angle between two vectors, in [0, 1] for non-negative weights.
/// Zero when either vector is zero.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < f64::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(0.0, 1.0)
}
