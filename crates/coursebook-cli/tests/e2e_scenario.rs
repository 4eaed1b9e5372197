//! End-to-end registry scenarios driven through the library API.
//!
//! These walk the same sequences a menu session would, checking IDs,
//! averages, and reports along the way.

use chrono::{TimeZone, Utc};

use coursebook_core::clock::FixedClock;
use coursebook_core::config::RegistrySettings;
use coursebook_core::model::{AssessmentId, AssessmentOptions, CourseId, UserId};
use coursebook_core::registry::DEFAULT_LOW_AVERAGE_THRESHOLD;
use coursebook_core::report::LowAverageReport;
use coursebook_core::{Registry, RegistryError};

#[test]
fn e2e_single_failing_student() {
    let mut reg = Registry::new();

    let a = reg.register_user("instructor", "A", "a@example.com").unwrap();
    let b = reg.register_user("student", "B", "b@example.com").unwrap();
    assert_eq!((a.id, b.id), (UserId(1), UserId(2)));

    let x = reg.create_course("X", a.id).unwrap();
    assert_eq!(x.id, CourseId(1));

    reg.enroll_student(b.id, x.id).unwrap();

    let midterm = reg
        .create_assessment("exam", "Midterm", x.id, 100.0, AssessmentOptions::default())
        .unwrap();
    assert_eq!(midterm.id, AssessmentId(1));

    reg.record_grade(midterm.id, b.id, 45.0, x.id).unwrap();
    assert_eq!(reg.average_for_student(b.id, x.id).unwrap(), 45.0);

    let low = reg.low_average_report(x.id, 60.0).unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].0.name, "B");
    assert_eq!(low[0].1, 45.0);
}

#[test]
fn e2e_mixed_class_report() {
    let due = Utc.with_ymd_and_hms(2026, 6, 30, 23, 59, 59).unwrap();
    let mut reg = Registry::with_clock(RegistrySettings::default(), Box::new(FixedClock(due)));

    let lecturer = reg.register_user("Instructor", "T", "t@example.com").unwrap();
    let course = reg.create_course("Statistics", lecturer.id).unwrap();

    let students: Vec<UserId> = ["s1", "s2", "s3"]
        .iter()
        .map(|name| {
            let s = reg
                .register_user("student", name, &format!("{name}@example.com"))
                .unwrap();
            reg.enroll_student(s.id, course.id).unwrap();
            s.id
        })
        .collect();

    let exam = reg
        .create_assessment("exam", "Final", course.id, 100.0, AssessmentOptions::exam(120))
        .unwrap();
    let essay = reg
        .create_assessment("assignment", "Essay", course.id, 100.0, AssessmentOptions::default())
        .unwrap();
    assert_eq!(essay.due_date(), Some(due));

    // Averages: s1 = 50, s2 = 70, s3 = 60 (essay ungraded for s3).
    reg.record_grade(exam.id, students[0], 40.0, course.id).unwrap();
    reg.record_grade(essay.id, students[0], 60.0, course.id).unwrap();
    reg.record_grade(exam.id, students[1], 70.0, course.id).unwrap();
    reg.record_grade(essay.id, students[1], 70.0, course.id).unwrap();
    reg.record_grade(exam.id, students[2], 60.0, course.id).unwrap();

    let report =
        LowAverageReport::build(&reg, course.id, DEFAULT_LOW_AVERAGE_THRESHOLD).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].student_id, students[0]);
    assert_eq!(report.entries[0].average, 50.0);
    assert_eq!(report.stats.student_count, 3);
    assert_eq!(report.stats.graded_count, 5);
    assert!((report.stats.class_average - 60.0).abs() < 1e-9);
}

#[test]
fn e2e_failures_do_not_consume_ids() {
    let mut reg = Registry::new();
    let student = reg.register_user("student", "S", "s@example.com").unwrap();

    assert!(matches!(
        reg.create_course("Nope", student.id),
        Err(RegistryError::InvalidArgument(_))
    ));
    assert!(matches!(
        reg.register_user("student", "Dup", "s@example.com"),
        Err(RegistryError::DuplicateUser { .. })
    ));

    let instructor = reg.register_user("instructor", "I", "i@example.com").unwrap();
    assert_eq!(instructor.id, UserId(2));
    let course = reg.create_course("Yes", instructor.id).unwrap();
    assert_eq!(course.id, CourseId(1));

    assert!(reg
        .create_assessment("quiz", "Q", course.id, 10.0, AssessmentOptions::default())
        .is_err());
    let first = reg
        .create_assessment("exam", "E", course.id, 10.0, AssessmentOptions::default())
        .unwrap();
    assert_eq!(first.id, AssessmentId(1));
}

#[test]
fn e2e_enrollment_views_stay_consistent() {
    let mut reg = Registry::new();
    let instructor = reg.register_user("instructor", "I", "i@example.com").unwrap();
    let student = reg.register_user("student", "S", "s@example.com").unwrap();
    let c1 = reg.create_course("One", instructor.id).unwrap();
    let c2 = reg.create_course("Two", instructor.id).unwrap();

    for course in [c1.id, c2.id, c1.id, c2.id] {
        let _ = reg.enroll_student(student.id, course);
    }

    let courses = reg.user(student.id).unwrap().enrolled_courses().to_vec();
    assert_eq!(courses, vec![c1.id, c2.id]);
    for course in [c1.id, c2.id] {
        let enrolled = reg.students_in_course(course).unwrap();
        assert_eq!(enrolled.len(), 1);
        assert_eq!(enrolled[0].id, student.id);
    }
}
