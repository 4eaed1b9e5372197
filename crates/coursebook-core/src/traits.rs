//! Behavior shared across the tagged entity variants.
//!
//! Users and assessments are enums rather than class hierarchies; these
//! traits give callers one place to ask "what kind is this" and to grade
//! without matching on the variant themselves.

use crate::error::RegistryResult;
use crate::model::UserId;

/// An entity whose variant has a human-readable kind name.
pub trait Kinded {
    /// Lowercase kind name (e.g. "student", "exam").
    fn kind_name(&self) -> &'static str;
}

/// Something that stores at most one score per student.
pub trait Gradable {
    /// Store `score` for `student`, replacing any previous score.
    ///
    /// Fails with `OutOfRange` when `score` is not in `[0, max]`; the
    /// stored scores are untouched in that case.
    fn record_score(&mut self, student: UserId, score: f64) -> RegistryResult<()>;

    /// The score recorded for `student`, if any.
    fn score(&self, student: UserId) -> Option<f64>;
}
