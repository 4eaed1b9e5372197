//! The registry: sole owner of users, courses, and assessments.
//!
//! Every operation validates all of its inputs first and then performs a
//! single commit, so a failed call never leaves partial state behind and
//! never consumes an ID.

use std::collections::BTreeMap;
use std::fmt;

use crate::clock::{Clock, SystemClock};
use crate::config::RegistrySettings;
use crate::error::{RegistryError, RegistryResult};
use crate::model::{
    Assessment, AssessmentDetail, AssessmentId, AssessmentKind, AssessmentOptions, Course,
    CourseId, Role, User, UserId, UserKind,
};
use crate::statistics::mean;
use crate::traits::{Gradable, Kinded};

/// Default cutoff for [`Registry::low_average_report`].
pub const DEFAULT_LOW_AVERAGE_THRESHOLD: f64 = 60.0;

/// In-memory store of every user, course, and assessment.
pub struct Registry {
    users: BTreeMap<UserId, User>,
    courses: BTreeMap<CourseId, Course>,
    next_user_id: u32,
    next_course_id: u32,
    next_assessment_id: u32,
    settings: RegistrySettings,
    clock: Box<dyn Clock>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("users", &self.users.len())
            .field("courses", &self.courses.len())
            .field("next_user_id", &self.next_user_id)
            .field("next_course_id", &self.next_course_id)
            .field("next_assessment_id", &self.next_assessment_id)
            .field("settings", &self.settings)
            .finish()
    }
}

fn rejected<T>(operation: &str, err: RegistryError) -> RegistryResult<T> {
    tracing::debug!(operation, error = %err, "operation rejected");
    Err(err)
}

impl Registry {
    /// An empty registry with default settings and the system clock.
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self::with_clock(settings, Box::new(SystemClock))
    }

    /// An empty registry whose defaulted due dates come from `clock`.
    pub fn with_clock(settings: RegistrySettings, clock: Box<dyn Clock>) -> Self {
        Self {
            users: BTreeMap::new(),
            courses: BTreeMap::new(),
            next_user_id: 1,
            next_course_id: 1,
            next_assessment_id: 1,
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Register a student or instructor.
    ///
    /// `kind` is matched case-insensitively against "student" and
    /// "instructor". The email must not belong to any existing user (exact,
    /// case-sensitive comparison).
    pub fn register_user(&mut self, kind: &str, name: &str, email: &str) -> RegistryResult<User> {
        if self.users.values().any(|u| u.email == email) {
            return rejected(
                "register_user",
                RegistryError::DuplicateUser {
                    email: email.to_string(),
                },
            );
        }

        let kind: UserKind = match kind.parse() {
            Ok(k) => k,
            Err(e) => return rejected("register_user", RegistryError::InvalidArgument(e)),
        };

        let role = match kind {
            UserKind::Student => Role::Student {
                enrolled_courses: Vec::new(),
            },
            UserKind::Instructor => Role::Instructor {
                specialty: self.settings.default_specialty.clone(),
            },
        };

        let user = User {
            id: UserId(self.next_user_id),
            name: name.to_string(),
            email: email.to_string(),
            role,
        };
        self.users.insert(user.id, user.clone());
        self.next_user_id += 1;

        tracing::info!(user_id = %user.id, kind = %kind, "user registered");
        Ok(user)
    }

    /// Create an empty course owned by an existing instructor.
    pub fn create_course(&mut self, name: &str, instructor_id: UserId) -> RegistryResult<Course> {
        if !self.users.get(&instructor_id).is_some_and(User::is_instructor) {
            return rejected(
                "create_course",
                RegistryError::invalid(format!("user {instructor_id} is not an instructor")),
            );
        }

        let course = Course {
            id: CourseId(self.next_course_id),
            name: name.to_string(),
            instructor_id,
            enrolled_students: Vec::new(),
            assessments: Vec::new(),
        };
        self.courses.insert(course.id, course.clone());
        self.next_course_id += 1;

        tracing::info!(course_id = %course.id, %instructor_id, "course created");
        Ok(course)
    }

    /// Enroll a student, recording the relation on both the course and the
    /// student.
    pub fn enroll_student(&mut self, student_id: UserId, course_id: CourseId) -> RegistryResult<()> {
        let Some(student) = self.users.get_mut(&student_id).filter(|u| u.is_student()) else {
            return rejected(
                "enroll_student",
                RegistryError::invalid(format!("user {student_id} is not a student")),
            );
        };
        let Some(course) = self.courses.get_mut(&course_id) else {
            return rejected("enroll_student", RegistryError::CourseNotFound(course_id));
        };
        if course.is_enrolled(student_id) {
            return rejected(
                "enroll_student",
                RegistryError::DuplicateEnrollment {
                    student_id,
                    course_id,
                },
            );
        }

        course.enrolled_students.push(student_id);
        student.add_course(course_id);

        tracing::info!(%student_id, %course_id, "student enrolled");
        Ok(())
    }

    /// Attach a new exam or assignment to a course.
    ///
    /// Assessment IDs come from one counter shared by all courses. An exam
    /// without a time limit gets the configured default; an assignment
    /// without a due date is due at the clock's current time.
    pub fn create_assessment(
        &mut self,
        kind: &str,
        name: &str,
        course_id: CourseId,
        max_score: f64,
        options: AssessmentOptions,
    ) -> RegistryResult<Assessment> {
        if !self.courses.contains_key(&course_id) {
            return rejected("create_assessment", RegistryError::CourseNotFound(course_id));
        }
        let kind: AssessmentKind = match kind.parse() {
            Ok(k) => k,
            Err(e) => return rejected("create_assessment", RegistryError::InvalidArgument(e)),
        };
        if !max_score.is_finite() || max_score <= 0.0 {
            return rejected(
                "create_assessment",
                RegistryError::invalid(format!("max score must be positive, got {max_score}")),
            );
        }

        let detail = match kind {
            AssessmentKind::Exam => {
                let time_limit_minutes = options
                    .time_limit_minutes
                    .unwrap_or(self.settings.default_time_limit_minutes);
                if time_limit_minutes == 0 {
                    return rejected(
                        "create_assessment",
                        RegistryError::invalid("time limit must be at least 1 minute"),
                    );
                }
                AssessmentDetail::Exam { time_limit_minutes }
            }
            AssessmentKind::Assignment => AssessmentDetail::Assignment {
                due_date: options.due_date.unwrap_or_else(|| self.clock.now()),
            },
        };

        let assessment = Assessment {
            id: AssessmentId(self.next_assessment_id),
            name: name.to_string(),
            course_id,
            max_score,
            scores: BTreeMap::new(),
            detail,
        };

        let Some(course) = self.courses.get_mut(&course_id) else {
            return rejected("create_assessment", RegistryError::CourseNotFound(course_id));
        };
        course.assessments.push(assessment.clone());
        self.next_assessment_id += 1;

        tracing::info!(assessment_id = %assessment.id, %course_id, kind = %kind, "assessment created");
        Ok(assessment)
    }

    /// Record (or overwrite) a student's score on one of a course's
    /// assessments.
    ///
    /// The assessment is looked up only within `course_id`. The student ID is
    /// stored as given; it is not checked against the user table.
    pub fn record_grade(
        &mut self,
        assessment_id: AssessmentId,
        student_id: UserId,
        score: f64,
        course_id: CourseId,
    ) -> RegistryResult<()> {
        let Some(course) = self.courses.get_mut(&course_id) else {
            return rejected("record_grade", RegistryError::CourseNotFound(course_id));
        };
        let Some(assessment) = course.assessment_mut(assessment_id) else {
            return rejected(
                "record_grade",
                RegistryError::AssessmentNotFound {
                    assessment_id,
                    course_id,
                },
            );
        };
        if let Err(e) = assessment.record_score(student_id, score) {
            return rejected("record_grade", e);
        }

        tracing::info!(%assessment_id, %student_id, score, "grade recorded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn course(&self, id: CourseId) -> Option<&Course> {
        self.courses.get(&id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    fn require_course(&self, course_id: CourseId) -> RegistryResult<&Course> {
        self.courses
            .get(&course_id)
            .ok_or(RegistryError::CourseNotFound(course_id))
    }

    /// Enrolled students of a course, in enrollment order.
    pub fn students_in_course(&self, course_id: CourseId) -> RegistryResult<Vec<&User>> {
        let course = self.require_course(course_id)?;
        Ok(course
            .enrolled_students
            .iter()
            .filter_map(|id| self.users.get(id))
            .collect())
    }

    /// Mean of the student's recorded scores across the course.
    ///
    /// Assessments without a score for the student are left out rather than
    /// counted as zero. A student with no scores averages exactly `0.0`.
    pub fn average_for_student(&self, student_id: UserId, course_id: CourseId) -> RegistryResult<f64> {
        let course = self.require_course(course_id)?;
        if !self.users.get(&student_id).is_some_and(User::is_student) {
            return Err(RegistryError::invalid(format!(
                "user {student_id} is not a student"
            )));
        }
        Ok(mean(&course.scores_for(student_id)))
    }

    /// Every enrolled student paired with their average, in enrollment
    /// order.
    pub fn course_roster(&self, course_id: CourseId) -> RegistryResult<Vec<(&User, f64)>> {
        self.students_in_course(course_id)?
            .into_iter()
            .map(|student| {
                let average = self.average_for_student(student.id, course_id)?;
                Ok::<_, RegistryError>((student, average))
            })
            .collect()
    }

    /// Enrolled students whose average is strictly below `threshold`.
    ///
    /// The threshold is compared against the raw average, on the same scale
    /// as the course's `max_score` values. It is not a percentage unless the
    /// assessments are scored out of 100.
    pub fn low_average_report(
        &self,
        course_id: CourseId,
        threshold: f64,
    ) -> RegistryResult<Vec<(&User, f64)>> {
        Ok(self
            .course_roster(course_id)?
            .into_iter()
            .filter(|&(_, average)| average < threshold)
            .collect())
    }

    /// Users whose kind name matches `kind`, ignoring case. Unknown kinds
    /// match nobody.
    pub fn users_by_kind(&self, kind: &str) -> Vec<&User> {
        let kind = kind.trim().to_lowercase();
        self.users
            .values()
            .filter(|u| u.kind_name() == kind)
            .collect()
    }

    /// All courses in creation order.
    pub fn all_courses(&self) -> Vec<&Course> {
        self.courses.values().collect()
    }

    pub fn assessments_for_course(&self, course_id: CourseId) -> RegistryResult<&[Assessment]> {
        Ok(&self.require_course(course_id)?.assessments)
    }

    /// The user a course names as its instructor.
    pub fn instructor_of(&self, course_id: CourseId) -> Option<&User> {
        self.courses
            .get(&course_id)
            .and_then(|c| self.users.get(&c.instructor_id))
    }
}
