use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PrepLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl PrepLevel {
    pub const ALL: [PrepLevel; 3] = [
        PrepLevel::Beginner,
        PrepLevel::Intermediate,
        PrepLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrepLevel::Beginner => "Beginner",
            PrepLevel::Intermediate => "Intermediate",
            PrepLevel::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    #[serde(rename = "Reading/Writing")]
    ReadingWriting,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 4] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::Kinesthetic,
        LearningStyle::ReadingWriting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::Kinesthetic => "Kinesthetic",
            LearningStyle::ReadingWriting => "Reading/Writing",
        }
    }
}

/// Returned when a string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl FromStr for PrepLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrepLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for LearningStyle {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LearningStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for PrepLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted mentor. Field order matches the CSV header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentorRecord {
    pub mentor_id: u64,
    pub name: String,
    pub preferred_subjects: String,
    pub target_colleges: String,
    pub prep_level: PrepLevel,
    pub learning_style: LearningStyle,
}

/// A validated registration, not yet assigned an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMentor {
    pub name: String,
    pub preferred_subjects: String,
    pub target_colleges: String,
    pub prep_level: PrepLevel,
    pub learning_style: LearningStyle,
}

impl NewMentor {
    pub fn into_record(self, mentor_id: u64) -> MentorRecord {
        MentorRecord {
            mentor_id,
            name: self.name,
            preferred_subjects: self.preferred_subjects,
            target_colleges: self.target_colleges,
            prep_level: self.prep_level,
            learning_style: self.learning_style,
        }
    }
}

/// The aspirant's side of a match. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryProfile {
    pub preferred_subjects: String,
    pub target_colleges: String,
    pub prep_level: PrepLevel,
    pub learning_style: LearningStyle,
}
