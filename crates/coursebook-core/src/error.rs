//! Registry error types.
//!
//! Every registry operation validates all of its inputs before it mutates
//! anything, so an `Err` always leaves the registry exactly as it was.

use thiserror::Error;

use crate::model::{AssessmentId, CourseId, UserId};

/// Errors returned by [`Registry`](crate::registry::Registry) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// Another user already registered with this email.
    #[error("email {email} is already registered")]
    DuplicateUser { email: String },

    /// The student is already in the course's enrolled set.
    #[error("student {student_id} is already enrolled in course {course_id}")]
    DuplicateEnrollment {
        student_id: UserId,
        course_id: CourseId,
    },

    /// No course with this ID exists.
    #[error("course with ID {0} does not exist")]
    CourseNotFound(CourseId),

    /// The course has no assessment with this ID.
    #[error("assessment {assessment_id} not found in course {course_id}")]
    AssessmentNotFound {
        assessment_id: AssessmentId,
        course_id: CourseId,
    },

    /// Unknown kind string, an ID naming the wrong kind of entity, or a
    /// malformed parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A score outside `[0, max_score]`.
    #[error("score {score} is out of range (0 to {max_score})")]
    OutOfRange { score: f64, max_score: f64 },
}

impl RegistryError {
    /// Returns `true` if the error reports an unknown course or assessment.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::CourseNotFound(_) | RegistryError::AssessmentNotFound { .. }
        )
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RegistryError::InvalidArgument(message.into())
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        assert!(RegistryError::CourseNotFound(CourseId(3)).is_not_found());
        assert!(RegistryError::AssessmentNotFound {
            assessment_id: AssessmentId(1),
            course_id: CourseId(1),
        }
        .is_not_found());
        assert!(!RegistryError::invalid("bad kind").is_not_found());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = RegistryError::DuplicateEnrollment {
            student_id: UserId(2),
            course_id: CourseId(1),
        };
        assert_eq!(
            err.to_string(),
            "student 2 is already enrolled in course 1"
        );

        let err = RegistryError::OutOfRange {
            score: 101.0,
            max_score: 100.0,
        };
        assert_eq!(err.to_string(), "score 101 is out of range (0 to 100)");
    }
}
