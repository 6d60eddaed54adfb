use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::mentor::{LearningStyle, NewMentor, PrepLevel};

/// Raw registration form. Enumerated fields arrive as text so that a bad value
/// is reported alongside any missing fields instead of as a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterMentorRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preferred_subjects: String,
    #[serde(default)]
    pub target_colleges: String,
    #[serde(default)]
    pub prep_level: String,
    #[serde(default)]
    pub learning_style: String,
}

impl RegisterMentorRequest {
    /// Checks every field and reports all problems at once.
    ///
    /// FAIL conditions:
    /// - name, preferred_subjects or target_colleges blank after trimming
    /// - prep_level not one of Beginner / Intermediate / Advanced
    /// - learning_style not one of Visual / Auditory / Kinesthetic / Reading/Writing
    ///
    /// Accepted values are kept verbatim.
    pub fn validate(self) -> Result<NewMentor, AppError> {
        let mut problems = Vec::new();

        for (field, value) in [
            ("name", &self.name),
            ("preferred_subjects", &self.preferred_subjects),
            ("target_colleges", &self.target_colleges),
        ] {
            if value.trim().is_empty() {
                problems.push(format!("{field} is required"));
            }
        }

        let prep_level = self.prep_level.parse::<PrepLevel>();
        if let Err(e) = &prep_level {
            problems.push(format!("prep_level: {e}"));
        }
        let learning_style = self.learning_style.parse::<LearningStyle>();
        if let Err(e) = &learning_style {
            problems.push(format!("learning_style: {e}"));
        }

        match (prep_level, learning_style) {
            (Ok(prep_level), Ok(learning_style)) if problems.is_empty() => Ok(NewMentor {
                name: self.name,
                preferred_subjects: self.preferred_subjects,
                target_colleges: self.target_colleges,
                prep_level,
                learning_style,
            }),
            _ => Err(AppError::Validation(format!(
                "Please fill all the required fields: {}",
                problems.join("; ")
            ))),
        }
    }
}
