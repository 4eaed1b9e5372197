//! Averages and course-level aggregate statistics.
//!
//! Averages are raw means of recorded scores on whatever scale each
//! assessment's `max_score` uses; nothing here normalizes to a percentage.

use serde::{Deserialize, Serialize};

use crate::model::{Course, CourseId};

/// Arithmetic mean of `values`, or exactly `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Summary numbers for one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStats {
    pub course_id: CourseId,
    /// Students in the enrolled set.
    pub student_count: usize,
    pub assessment_count: usize,
    /// Scores recorded across all assessments of the course.
    pub graded_count: usize,
    /// Enrolled students with at least one recorded score.
    pub graded_students: usize,
    /// Mean of per-student averages over `graded_students` (0 when none).
    pub class_average: f64,
}

/// Compute aggregate statistics for a course.
pub fn compute_course_stats(course: &Course) -> CourseStats {
    let graded_count = course.assessments.iter().map(|a| a.scores.len()).sum();

    let student_averages: Vec<f64> = course
        .enrolled_students
        .iter()
        .map(|&s| course.scores_for(s))
        .filter(|scores| !scores.is_empty())
        .map(|scores| mean(&scores))
        .collect();

    CourseStats {
        course_id: course.id,
        student_count: course.enrolled_students.len(),
        assessment_count: course.assessments.len(),
        graded_count,
        graded_students: student_averages.len(),
        class_average: mean(&student_averages),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{Assessment, AssessmentDetail, AssessmentId, UserId};

    fn assessment(id: u32, scores: &[(u32, f64)]) -> Assessment {
        Assessment {
            id: AssessmentId(id),
            name: format!("A{id}"),
            course_id: CourseId(1),
            max_score: 100.0,
            scores: scores.iter().map(|&(s, v)| (UserId(s), v)).collect::<BTreeMap<_, _>>(),
            detail: AssessmentDetail::Exam {
                time_limit_minutes: 60,
            },
        }
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_of_scores() {
        assert!((mean(&[80.0, 60.0, 100.0]) - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn course_stats_skip_ungraded_students() {
        let course = Course {
            id: CourseId(1),
            name: "X".into(),
            instructor_id: UserId(1),
            enrolled_students: vec![UserId(2), UserId(3), UserId(4)],
            assessments: vec![
                assessment(1, &[(2, 50.0), (3, 90.0)]),
                assessment(2, &[(2, 70.0)]),
            ],
        };

        let stats = compute_course_stats(&course);
        assert_eq!(stats.student_count, 3);
        assert_eq!(stats.assessment_count, 2);
        assert_eq!(stats.graded_count, 3);
        assert_eq!(stats.graded_students, 2);
        // (60 + 90) / 2
        assert!((stats.class_average - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn course_stats_for_empty_course() {
        let course = Course {
            id: CourseId(7),
            name: "Empty".into(),
            instructor_id: UserId(1),
            enrolled_students: vec![],
            assessments: vec![],
        };
        let stats = compute_course_stats(&course);
        assert_eq!(stats.course_id, CourseId(7));
        assert_eq!(stats.graded_students, 0);
        assert_eq!(stats.class_average, 0.0);
    }
}
