use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::mentor::{LearningStyle, MentorRecord, PrepLevel};

/// Choices offered by the aspirant's query form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryOptions {
    pub preferred_subjects: Vec<String>,
    pub target_colleges: Vec<String>,
    /// Always all three levels, whatever the pool holds.
    pub prep_levels: Vec<PrepLevel>,
    pub learning_styles: Vec<LearningStyle>,
}

/// Distinct observed values in first-seen order. Blank values are skipped.
pub fn query_options(mentors: &[MentorRecord]) -> QueryOptions {
    QueryOptions {
        preferred_subjects: distinct(mentors.iter().map(|m| m.preferred_subjects.as_str())),
        target_colleges: distinct(mentors.iter().map(|m| m.target_colleges.as_str())),
        prep_levels: PrepLevel::ALL.to_vec(),
        learning_styles: {
            let mut seen = HashSet::new();
            mentors
                .iter()
                .map(|m| m.learning_style)
                .filter(|style| seen.insert(*style))
                .collect()
        },
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
