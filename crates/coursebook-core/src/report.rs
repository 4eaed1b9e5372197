//! Low-average report types with JSON and text rendering.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::model::{CourseId, UserId};
use crate::registry::Registry;
use crate::statistics::{compute_course_stats, CourseStats};

/// Students of one course whose average falls below a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowAverageReport {
    pub course_id: CourseId,
    pub course_name: String,
    /// Raw cutoff; entries satisfy `average < threshold`.
    pub threshold: f64,
    pub entries: Vec<LowAverageEntry>,
    pub stats: CourseStats,
}

/// One flagged student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowAverageEntry {
    pub student_id: UserId,
    pub name: String,
    pub email: String,
    pub average: f64,
}

impl LowAverageReport {
    /// Build the report for `course_id` from the registry's current state.
    pub fn build(registry: &Registry, course_id: CourseId, threshold: f64) -> RegistryResult<Self> {
        let entries = registry
            .low_average_report(course_id, threshold)?
            .into_iter()
            .map(|(student, average)| LowAverageEntry {
                student_id: student.id,
                name: student.name.clone(),
                email: student.email.clone(),
                average,
            })
            .collect();

        // low_average_report already rejected unknown courses.
        let course = registry
            .course(course_id)
            .ok_or(RegistryError::CourseNotFound(course_id))?;

        Ok(Self {
            course_id,
            course_name: course.name.clone(),
            threshold,
            entries,
            stats: compute_course_stats(course),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize report")
    }

    /// Plain-text rendering for the terminal.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Students below {} in {} (ID: {})",
            self.threshold, self.course_name, self.course_id
        );

        if self.entries.is_empty() {
            let _ = writeln!(
                out,
                "No students average below {} in this course.",
                self.threshold
            );
        } else {
            for (i, e) in self.entries.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} ({}) - average: {:.2}",
                    i + 1,
                    e.name,
                    e.email,
                    e.average
                );
            }
        }

        let _ = writeln!(
            out,
            "\n{} student(s), {} assessment(s), {} grade(s) recorded, class average {:.2}",
            self.stats.student_count,
            self.stats.assessment_count,
            self.stats.graded_count,
            self.stats.class_average
        );
        out
    }
}
