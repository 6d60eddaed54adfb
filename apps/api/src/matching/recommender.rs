//! Mentor Matcher — pluggable, trait-based ranking of mentors against a query profile.
//!
//! Default: `TfidfMatcher` (pure-Rust, deterministic, fully testable).
//!
//! `AppState` holds an `Arc<dyn MentorMatcher>`, chosen at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::matching::tfidf::{cosine_similarity, TfidfModel};
use crate::models::mentor::{LearningStyle, MentorRecord, PrepLevel, QueryProfile};

pub const DEFAULT_TOP_K: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Output data model
// ────────────────────────────────────────────────────────────────────────────

/// One ranked mentor. `rank` starts at 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentorMatch {
    pub rank: usize,
    pub mentor: MentorRecord,
    pub similarity_score: f64, // 0.0 – 1.0
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap ranking backends without touching handlers.
#[async_trait]
pub trait MentorMatcher: Send + Sync {
    async fn recommend(
        &self,
        query: &QueryProfile,
        mentors: &[MentorRecord],
        k: usize,
    ) -> Result<Vec<MentorMatch>, AppError>;

    /// Label surfaced in responses, e.g. "tfidf".
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// TfidfMatcher — default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Algorithm:
/// 1. One document per profile: subjects, colleges, prep level, learning style, space-joined
/// 2. Fit TF-IDF on the mentor documents only, then project the query
/// 3. Score = cosine similarity
/// 4. Stable sort by score descending, ties keep insertion order
/// 5. Keep the first k, zero scores included
pub struct TfidfMatcher;

#[async_trait]
impl MentorMatcher for TfidfMatcher {
    async fn recommend(
        &self,
        query: &QueryProfile,
        mentors: &[MentorRecord],
        k: usize,
    ) -> Result<Vec<MentorMatch>, AppError> {
        Ok(rank_mentors(query, mentors, k))
    }

    fn backend(&self) -> &'static str {
        "tfidf"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core ranking
// ────────────────────────────────────────────────────────────────────────────

pub fn profile_document(
    preferred_subjects: &str,
    target_colleges: &str,
    prep_level: PrepLevel,
    learning_style: LearningStyle,
) -> String {
    format!("{preferred_subjects} {target_colleges} {prep_level} {learning_style}")
}

/// Returns `min(k, mentors.len())` matches ordered by non-increasing score.
pub fn rank_mentors(query: &QueryProfile, mentors: &[MentorRecord], k: usize) -> Vec<MentorMatch> {
    if mentors.is_empty() || k == 0 {
        return Vec::new();
    }

    let documents: Vec<String> = mentors
        .iter()
        .map(|m| {
            profile_document(
                &m.preferred_subjects,
                &m.target_colleges,
                m.prep_level,
                m.learning_style,
            )
        })
        .collect();
    let model = TfidfModel::fit(&documents);

    let query_vector = model.transform(&profile_document(
        &query.preferred_subjects,
        &query.target_colleges,
        query.prep_level,
        query.learning_style,
    ));

    let mut scored: Vec<(&MentorRecord, f64)> = mentors
        .iter()
        .zip(&documents)
        .map(|(mentor, document)| {
            (mentor, cosine_similarity(&query_vector, &model.transform(document)))
        })
        .collect();

    // sort_by is stable: equal scores stay in insertion order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    debug!(
        "Ranked {} mentors over a {}-term vocabulary",
        mentors.len(),
        model.vocabulary_len()
    );

    scored
        .into_iter()
        .take(k)
        .enumerate()
        .map(|(i, (mentor, similarity_score))| MentorMatch {
            rank: i + 1,
            mentor: mentor.clone(),
            similarity_score,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
