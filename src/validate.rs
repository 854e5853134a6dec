use thiserror::Error;

use crate::model::{Assessment, StudentDraft};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("required field is empty: {field}")]
    MissingRequiredField { field: &'static str },
    #[error("score {} out of range: {}", .assessment.field(), .value)]
    ScoreOutOfRange { assessment: Assessment, value: f64 },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredField { .. } => "missing_required_field",
            ValidationError::ScoreOutOfRange { .. } => "score_out_of_range",
        }
    }

    /// Message shown inline on the form.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::MissingRequiredField { .. } => {
                "Lütfen tüm zorunlu alanları doldurun."
            }
            ValidationError::ScoreOutOfRange { .. } => "Puanlar 0 ile 100 arasında olmalıdır.",
        }
    }
}

/// First failing rule wins: required text fields, then score ranges.
/// Emptiness is checked on the raw string, without trimming.
pub fn validate(draft: &StudentDraft) -> Result<(), ValidationError> {
    let required = [
        ("studentNo", &draft.student_no),
        ("fullName", &draft.full_name),
        ("className", &draft.class_name),
    ];
    for (field, value) in required {
        if value.is_empty() {
            return Err(ValidationError::MissingRequiredField { field });
        }
    }

    for (assessment, value) in draft.scores.iter() {
        // NaN fails both comparisons, so it is rejected here too.
        if !(0.0..=100.0).contains(&value) {
            return Err(ValidationError::ScoreOutOfRange { assessment, value });
        }
    }

    Ok(())
}
