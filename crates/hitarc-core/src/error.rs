//! Assessment error types.
//!
//! Grading never fails: malformed responses are scored instead. These errors
//! cover plan assembly and content-bank problems that a caller must handle.

use thiserror::Error;

use crate::model::SectionCode;

/// Errors that can occur while assembling plans or loading content banks.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// A section was requested but its bank has no entries at all.
    #[error("section {section} has no bank entries to draw from")]
    EmptySection { section: String },

    /// A section code or name could not be resolved.
    #[error("unknown section: {0}")]
    UnknownSection(String),

    /// A content bank is missing a required category.
    #[error("content bank has no entries for '{0}'")]
    EmptyBankCategory(&'static str),

    /// A bank entry is internally inconsistent.
    #[error("invalid bank entry '{id}': {message}")]
    InvalidEntry { id: String, message: String },

    /// A standard plan was requested with no sections selected.
    #[error("no sections selected")]
    NoSections,

    /// The plan to verify was assembled from a tiered bank but none was supplied.
    #[error("plan {0} was assembled from a tiered bank; supply the bank to verify it")]
    MissingTieredBank(String),
}

impl AssessmentError {
    /// Returns `true` if the error points at content rather than the caller's request.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            AssessmentError::EmptySection { .. }
                | AssessmentError::EmptyBankCategory(_)
                | AssessmentError::InvalidEntry { .. }
        )
    }

    pub(crate) fn empty_section(code: SectionCode) -> Self {
        AssessmentError::EmptySection {
            section: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_content_errors() {
        assert!(AssessmentError::empty_section(SectionCode::A).is_content_error());
        assert!(AssessmentError::EmptyBankCategory("spelling").is_content_error());
        assert!(!AssessmentError::NoSections.is_content_error());
        assert!(!AssessmentError::UnknownSection("Z".into()).is_content_error());
    }

    #[test]
    fn messages_name_the_section() {
        let err = AssessmentError::empty_section(SectionCode::C);
        assert_eq!(err.to_string(), "section C has no bank entries to draw from");
    }
}
