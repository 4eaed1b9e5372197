//! Core data model types for coursebook.
//!
//! Users and assessments are tagged variants: the shared fields live on the
//! struct and the kind-specific fields live on the variant. Entities are only
//! ever built by the [`Registry`](crate::registry::Registry).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::traits::{Gradable, Kinded};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a student or instructor.
    UserId
);
id_type!(
    /// Identifier of a course.
    CourseId
);
id_type!(
    /// Identifier of an exam or assignment, unique across all courses.
    AssessmentId
);

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// The two kinds of user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Student,
    Instructor,
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKind::Student => write!(f, "student"),
            UserKind::Instructor => write!(f, "instructor"),
        }
    }
}

impl FromStr for UserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(UserKind::Student),
            "instructor" => Ok(UserKind::Instructor),
            other => Err(format!("unknown user kind: {other}")),
        }
    }
}

/// A registered student or instructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Unique across every user, compared case-sensitively.
    pub email: String,
    pub role: Role,
}

/// Kind-specific user data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Role {
    Student {
        /// Courses in enrollment order, without duplicates.
        #[serde(default)]
        enrolled_courses: Vec<CourseId>,
    },
    Instructor { specialty: String },
}

impl User {
    pub fn kind(&self) -> UserKind {
        match self.role {
            Role::Student { .. } => UserKind::Student,
            Role::Instructor { .. } => UserKind::Instructor,
        }
    }

    pub fn is_student(&self) -> bool {
        self.kind() == UserKind::Student
    }

    pub fn is_instructor(&self) -> bool {
        self.kind() == UserKind::Instructor
    }

    /// Courses a student is enrolled in. Always empty for instructors.
    pub fn enrolled_courses(&self) -> &[CourseId] {
        match &self.role {
            Role::Student { enrolled_courses } => enrolled_courses,
            Role::Instructor { .. } => &[],
        }
    }

    pub fn specialty(&self) -> Option<&str> {
        match &self.role {
            Role::Instructor { specialty } => Some(specialty),
            Role::Student { .. } => None,
        }
    }

    /// Append a course to a student's list. Returns `false` for instructors
    /// and for courses already listed.
    pub(crate) fn add_course(&mut self, course_id: CourseId) -> bool {
        match &mut self.role {
            Role::Student { enrolled_courses } if !enrolled_courses.contains(&course_id) => {
                enrolled_courses.push(course_id);
                true
            }
            _ => false,
        }
    }
}

impl Kinded for User {
    fn kind_name(&self) -> &'static str {
        match self.role {
            Role::Student { .. } => "student",
            Role::Instructor { .. } => "instructor",
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind() {
            UserKind::Student => "Student",
            UserKind::Instructor => "Instructor",
        };
        write!(f, "{label}: {} ({})", self.name, self.email)
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

/// A course taught by one instructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub instructor_id: UserId,
    /// Enrolled students in enrollment order. Uniqueness is checked on insert.
    #[serde(default)]
    pub enrolled_students: Vec<UserId>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl Course {
    pub fn is_enrolled(&self, student_id: UserId) -> bool {
        self.enrolled_students.contains(&student_id)
    }

    pub(crate) fn assessment_mut(&mut self, assessment_id: AssessmentId) -> Option<&mut Assessment> {
        self.assessments.iter_mut().find(|a| a.id == assessment_id)
    }

    /// Every score recorded for `student_id` across this course, in
    /// assessment order. Ungraded assessments are skipped.
    pub fn scores_for(&self, student_id: UserId) -> Vec<f64> {
        self.assessments
            .iter()
            .filter_map(|a| a.score(student_id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

/// The two kinds of assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Exam,
    Assignment,
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentKind::Exam => write!(f, "exam"),
            AssessmentKind::Assignment => write!(f, "assignment"),
        }
    }
}

impl FromStr for AssessmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exam" => Ok(AssessmentKind::Exam),
            "assignment" => Ok(AssessmentKind::Assignment),
            other => Err(format!("unknown assessment kind: {other}")),
        }
    }
}

/// A gradable exam or assignment attached to a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub name: String,
    pub course_id: CourseId,
    pub max_score: f64,
    /// Recorded scores keyed by student. At most one per student.
    #[serde(default)]
    pub scores: BTreeMap<UserId, f64>,
    pub detail: AssessmentDetail,
}

/// Kind-specific assessment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssessmentDetail {
    Exam { time_limit_minutes: u32 },
    Assignment { due_date: DateTime<Utc> },
}

/// Optional kind-specific parameters for creating an assessment.
///
/// Fields that don't apply to the requested kind are ignored.
#[derive(Debug, Clone, Default)]
pub struct AssessmentOptions {
    /// Exam time limit. Falls back to the registry's configured default.
    pub time_limit_minutes: Option<u32>,
    /// Assignment due date. Falls back to the registry clock's current time.
    pub due_date: Option<DateTime<Utc>>,
}

impl AssessmentOptions {
    pub fn exam(time_limit_minutes: u32) -> Self {
        Self {
            time_limit_minutes: Some(time_limit_minutes),
            ..Default::default()
        }
    }

    pub fn assignment(due_date: DateTime<Utc>) -> Self {
        Self {
            due_date: Some(due_date),
            ..Default::default()
        }
    }
}

impl Assessment {
    pub fn kind(&self) -> AssessmentKind {
        match self.detail {
            AssessmentDetail::Exam { .. } => AssessmentKind::Exam,
            AssessmentDetail::Assignment { .. } => AssessmentKind::Assignment,
        }
    }

    pub fn time_limit_minutes(&self) -> Option<u32> {
        match self.detail {
            AssessmentDetail::Exam { time_limit_minutes } => Some(time_limit_minutes),
            AssessmentDetail::Assignment { .. } => None,
        }
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        match self.detail {
            AssessmentDetail::Assignment { due_date } => Some(due_date),
            AssessmentDetail::Exam { .. } => None,
        }
    }
}

impl Kinded for Assessment {
    fn kind_name(&self) -> &'static str {
        match self.detail {
            AssessmentDetail::Exam { .. } => "exam",
            AssessmentDetail::Assignment { .. } => "assignment",
        }
    }
}

impl Gradable for Assessment {
    fn record_score(&mut self, student: UserId, score: f64) -> RegistryResult<()> {
        if !score.is_finite() || score < 0.0 || score > self.max_score {
            return Err(RegistryError::OutOfRange {
                score,
                max_score: self.max_score,
            });
        }
        self.scores.insert(student, score);
        Ok(())
    }

    fn score(&self, student: UserId) -> Option<f64> {
        self.scores.get(&student).copied()
    }
}
