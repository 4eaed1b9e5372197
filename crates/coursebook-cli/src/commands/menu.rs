//! The `coursebook menu` command: a line-oriented interactive loop.
//!
//! Every choice is read from the input as one line. Lists are selected by
//! their 1-based position. Registry errors are printed and the loop carries
//! on; end of input behaves like choosing "Exit".

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::{Cell, Table};

use coursebook_core::config::{check_threshold, CoursebookConfig};
use coursebook_core::model::{
    Assessment, AssessmentDetail, AssessmentId, AssessmentKind, AssessmentOptions, CourseId, UserId,
    UserKind,
};
use coursebook_core::report::LowAverageReport;
use coursebook_core::traits::Kinded;
use coursebook_core::{Registry, RegistryResult};

const RULE: &str = "==================================================";

pub fn execute(config: &CoursebookConfig) -> Result<()> {
    let registry = Registry::with_settings(config.registry.clone());
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(
        registry,
        stdin.lock(),
        stdout.lock(),
        config.low_average_threshold,
    )
    .run()
}

/// Print a registry error and swallow it.
fn report<T, W: Write>(out: &mut W, result: RegistryResult<T>) -> io::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            writeln!(out, "Error: {e}")?;
            Ok(None)
        }
    }
}

/// End of the due date's day, in UTC.
fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
}

fn describe_detail(assessment: &Assessment) -> String {
    match assessment.detail {
        AssessmentDetail::Exam { time_limit_minutes } => format!("{time_limit_minutes} min"),
        AssessmentDetail::Assignment { due_date } => {
            format!("due {}", due_date.format("%Y-%m-%d"))
        }
    }
}

pub struct Menu<R, W> {
    registry: Registry,
    input: R,
    out: W,
    default_threshold: f64,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(registry: Registry, input: R, out: W, default_threshold: f64) -> Self {
        Self {
            registry,
            input,
            out,
            default_threshold,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            self.print_main_menu()?;
            let Some(choice) = self.ask("Select an option: ")? else {
                writeln!(self.out, "\nGoodbye!")?;
                break;
            };
            tracing::debug!("main menu choice: {choice}");

            match choice.as_str() {
                "1" => self.register_user()?,
                "2" => self.create_course()?,
                "3" => self.enroll_student()?,
                "4" => self.create_assessment()?,
                "5" => self.record_grade()?,
                "6" => self.queries()?,
                "7" => self.low_average_report()?,
                "8" => {
                    writeln!(self.out, "Goodbye!")?;
                    break;
                }
                _ => writeln!(self.out, "Invalid option. Try again.")?,
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn print_main_menu(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n{RULE}")?;
        writeln!(self.out, "COURSEBOOK")?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "1. Register user")?;
        writeln!(self.out, "2. Create course")?;
        writeln!(self.out, "3. Enroll student in course")?;
        writeln!(self.out, "4. Create assessment")?;
        writeln!(self.out, "5. Record grade")?;
        writeln!(self.out, "6. Queries")?;
        writeln!(self.out, "7. Low-average report")?;
        writeln!(self.out, "8. Exit")?;
        writeln!(self.out, "{RULE}")
    }

    // -----------------------------------------------------------------------
    // Input helpers
    // -----------------------------------------------------------------------

    /// Prompt and read one trimmed line. `None` at end of input.
    fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt for a value of type `T`, printing an error on bad input.
    fn ask_parsed<T: FromStr>(&mut self, label: &str) -> io::Result<Option<T>> {
        let Some(answer) = self.ask(label)? else {
            return Ok(None);
        };
        match answer.parse() {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                writeln!(self.out, "Error: '{answer}' is not a valid number")?;
                Ok(None)
            }
        }
    }

    /// Prompt for a 1-based position in a list of `len` items and return the
    /// 0-based index.
    fn choose(&mut self, label: &str, len: usize) -> io::Result<Option<usize>> {
        let Some(n) = self.ask_parsed::<usize>(label)? else {
            return Ok(None);
        };
        if (1..=len).contains(&n) {
            Ok(Some(n - 1))
        } else {
            writeln!(self.out, "Invalid selection")?;
            Ok(None)
        }
    }

    fn select_course(&mut self) -> io::Result<Option<(CourseId, String)>> {
        let courses: Vec<(CourseId, String)> = self
            .registry
            .all_courses()
            .iter()
            .map(|c| (c.id, c.name.clone()))
            .collect();
        if courses.is_empty() {
            writeln!(self.out, "No courses registered.")?;
            return Ok(None);
        }

        writeln!(self.out, "Available courses:")?;
        for (i, (id, name)) in courses.iter().enumerate() {
            writeln!(self.out, "{}. {name} (ID: {id})", i + 1)?;
        }
        let choice = self.choose("Select a course number: ", courses.len())?;
        Ok(choice.map(|i| courses[i].clone()))
    }

    fn select_user(&mut self, kind: UserKind) -> io::Result<Option<(UserId, String)>> {
        let users: Vec<(UserId, String, String)> = self
            .registry
            .users_by_kind(&kind.to_string())
            .iter()
            .map(|u| {
                let extra = match u.specialty() {
                    Some(s) => format!(" - Specialty: {s}"),
                    None => String::new(),
                };
                (u.id, u.name.clone(), format!("{} ({}){extra}", u.name, u.email))
            })
            .collect();
        if users.is_empty() {
            writeln!(self.out, "No {kind}s registered.")?;
            return Ok(None);
        }

        writeln!(self.out, "Available {kind}s:")?;
        for (i, (_, _, label)) in users.iter().enumerate() {
            writeln!(self.out, "{}. {label}", i + 1)?;
        }
        let choice = self.choose(&format!("Select the {kind} number: "), users.len())?;
        Ok(choice.map(|i| (users[i].0, users[i].1.clone())))
    }

    // -----------------------------------------------------------------------
    // Main menu actions
    // -----------------------------------------------------------------------

    fn register_user(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n--- REGISTER USER ---")?;
        let Some(kind) = self.ask("User kind (student/instructor): ")? else {
            return Ok(());
        };
        if let Err(e) = kind.parse::<UserKind>() {
            writeln!(self.out, "Error: {e}")?;
            return Ok(());
        }
        let Some(name) = self.ask("Name: ")? else {
            return Ok(());
        };
        let Some(email) = self.ask("Email: ")? else {
            return Ok(());
        };

        let result = self.registry.register_user(&kind, &name, &email);
        if let Some(user) = report(&mut self.out, result)? {
            writeln!(self.out, "User registered: {user} (ID: {})", user.id)?;
        }
        Ok(())
    }

    fn create_course(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n--- CREATE COURSE ---")?;
        let Some((instructor_id, _)) = self.select_user(UserKind::Instructor)? else {
            return Ok(());
        };
        let Some(name) = self.ask("Course name: ")? else {
            return Ok(());
        };

        let result = self.registry.create_course(&name, instructor_id);
        if let Some(course) = report(&mut self.out, result)? {
            writeln!(self.out, "Course created: {} (ID: {})", course.name, course.id)?;
        }
        Ok(())
    }

    fn enroll_student(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n--- ENROLL STUDENT IN COURSE ---")?;
        let Some((student_id, student_name)) = self.select_user(UserKind::Student)? else {
            return Ok(());
        };
        let Some((course_id, course_name)) = self.select_course()? else {
            return Ok(());
        };

        let result = self.registry.enroll_student(student_id, course_id);
        if report(&mut self.out, result)?.is_some() {
            writeln!(
                self.out,
                "Student {student_name} enrolled in course {course_name}"
            )?;
        }
        Ok(())
    }

    fn create_assessment(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n--- CREATE ASSESSMENT ---")?;
        let Some((course_id, _)) = self.select_course()? else {
            return Ok(());
        };
        let Some(kind) = self.ask("Assessment kind (exam/assignment): ")? else {
            return Ok(());
        };
        let parsed_kind = match kind.parse::<AssessmentKind>() {
            Ok(k) => k,
            Err(e) => {
                writeln!(self.out, "Error: {e}")?;
                return Ok(());
            }
        };
        let Some(name) = self.ask("Assessment name: ")? else {
            return Ok(());
        };
        let Some(max_score) = self.ask_parsed::<f64>("Max score: ")? else {
            return Ok(());
        };

        let options = match parsed_kind {
            AssessmentKind::Exam => {
                let label = format!(
                    "Time limit in minutes (default {}): ",
                    self.registry.settings().default_time_limit_minutes
                );
                let Some(raw) = self.ask(&label)? else {
                    return Ok(());
                };
                if raw.is_empty() {
                    AssessmentOptions::default()
                } else if let Ok(minutes) = raw.parse::<u32>() {
                    AssessmentOptions::exam(minutes)
                } else {
                    writeln!(self.out, "Error: '{raw}' is not a valid number")?;
                    return Ok(());
                }
            }
            AssessmentKind::Assignment => {
                let Some(raw) = self.ask("Due date (YYYY-MM-DD, empty for now): ")? else {
                    return Ok(());
                };
                if raw.is_empty() {
                    AssessmentOptions::default()
                } else if let Some(due) = parse_due_date(&raw) {
                    AssessmentOptions::assignment(due)
                } else {
                    writeln!(self.out, "Error: due date must look like YYYY-MM-DD")?;
                    return Ok(());
                }
            }
        };

        let result = self
            .registry
            .create_assessment(&kind, &name, course_id, max_score, options);
        if let Some(assessment) = report(&mut self.out, result)? {
            writeln!(
                self.out,
                "Assessment created: {} (ID: {})",
                assessment.name, assessment.id
            )?;
        }
        Ok(())
    }

    fn record_grade(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n--- RECORD GRADE ---")?;
        let Some((course_id, _)) = self.select_course()? else {
            return Ok(());
        };

        let result = self.registry.assessments_for_course(course_id);
        let Some(assessments) = report(&mut self.out, result)? else {
            return Ok(());
        };
        let assessments: Vec<(AssessmentId, String, String)> = assessments
            .iter()
            .map(|a| {
                (
                    a.id,
                    a.name.clone(),
                    format!("{} ({}) - max score: {}", a.name, a.kind_name(), a.max_score),
                )
            })
            .collect();
        if assessments.is_empty() {
            writeln!(self.out, "This course has no assessments.")?;
            return Ok(());
        }
        writeln!(self.out, "Available assessments:")?;
        for (i, (_, _, label)) in assessments.iter().enumerate() {
            writeln!(self.out, "{}. {label}", i + 1)?;
        }
        let Some(a) = self.choose("Select an assessment number: ", assessments.len())? else {
            return Ok(());
        };
        let (assessment_id, assessment_name, _) = assessments[a].clone();

        let result = self.registry.students_in_course(course_id);
        let students: Vec<(UserId, String, String)> = match report(&mut self.out, result)? {
            Some(list) => list
                .iter()
                .map(|u| (u.id, u.name.clone(), u.email.clone()))
                .collect(),
            None => return Ok(()),
        };
        if students.is_empty() {
            writeln!(self.out, "This course has no enrolled students.")?;
            return Ok(());
        }
        writeln!(self.out, "Enrolled students:")?;
        for (i, (_, name, email)) in students.iter().enumerate() {
            writeln!(self.out, "{}. {name} ({email})", i + 1)?;
        }
        let Some(s) = self.choose("Select a student number: ", students.len())? else {
            return Ok(());
        };
        let (student_id, student_name, _) = students[s].clone();

        let Some(score) = self.ask_parsed::<f64>("Score: ")? else {
            return Ok(());
        };
        let result = self
            .registry
            .record_grade(assessment_id, student_id, score, course_id);
        if report(&mut self.out, result)?.is_some() {
            writeln!(
                self.out,
                "Grade recorded for {student_name} on {assessment_name}"
            )?;
        }
        Ok(())
    }

    fn low_average_report(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n--- LOW-AVERAGE REPORT ---")?;
        let Some((course_id, _)) = self.select_course()? else {
            return Ok(());
        };
        let label = format!(
            "Low-average threshold (default {}): ",
            self.default_threshold
        );
        let Some(raw) = self.ask(&label)? else {
            return Ok(());
        };
        let threshold = if raw.is_empty() {
            self.default_threshold
        } else {
            match raw.parse::<f64>() {
                Ok(t) => t,
                Err(_) => {
                    writeln!(self.out, "Error: '{raw}' is not a valid number")?;
                    return Ok(());
                }
            }
        };
        if let Err(e) = check_threshold(threshold) {
            writeln!(self.out, "Error: {e}")?;
            return Ok(());
        }

        let result = LowAverageReport::build(&self.registry, course_id, threshold);
        if let Some(low) = report(&mut self.out, result)? {
            writeln!(self.out)?;
            write!(self.out, "{}", low.to_text())?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries submenu
    // -----------------------------------------------------------------------

    fn queries(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "\n{RULE}")?;
            writeln!(self.out, "QUERIES")?;
            writeln!(self.out, "{RULE}")?;
            writeln!(self.out, "1. List all courses")?;
            writeln!(self.out, "2. List students")?;
            writeln!(self.out, "3. List instructors")?;
            writeln!(self.out, "4. Students in a course")?;
            writeln!(self.out, "5. Assessments of a course")?;
            writeln!(self.out, "6. Back to main menu")?;
            writeln!(self.out, "{RULE}")?;

            let Some(choice) = self.ask("Select an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.list_courses()?,
                "2" => self.list_users(UserKind::Student)?,
                "3" => self.list_users(UserKind::Instructor)?,
                "4" => self.show_roster()?,
                "5" => self.show_assessments()?,
                "6" => return Ok(()),
                _ => writeln!(self.out, "Invalid option. Try again.")?,
            }
        }
    }

    fn list_courses(&mut self) -> io::Result<()> {
        let courses = self.registry.all_courses();
        if courses.is_empty() {
            return writeln!(self.out, "No courses registered.");
        }

        let mut table = Table::new();
        table.set_header(vec!["ID", "Course", "Instructor", "Students", "Assessments"]);
        for course in courses {
            let instructor = self
                .registry
                .instructor_of(course.id)
                .map_or("Unknown", |u| u.name.as_str());
            table.add_row(vec![
                Cell::new(course.id),
                Cell::new(&course.name),
                Cell::new(instructor),
                Cell::new(course.enrolled_students.len()),
                Cell::new(course.assessments.len()),
            ]);
        }
        writeln!(self.out, "\n{table}")
    }

    fn list_users(&mut self, kind: UserKind) -> io::Result<()> {
        let users = self.registry.users_by_kind(&kind.to_string());
        if users.is_empty() {
            return writeln!(self.out, "No {kind}s registered.");
        }

        let mut table = Table::new();
        match kind {
            UserKind::Student => {
                table.set_header(vec!["ID", "Name", "Email", "Courses"]);
                for u in users {
                    table.add_row(vec![
                        Cell::new(u.id),
                        Cell::new(&u.name),
                        Cell::new(&u.email),
                        Cell::new(u.enrolled_courses().len()),
                    ]);
                }
            }
            UserKind::Instructor => {
                table.set_header(vec!["ID", "Name", "Email", "Specialty"]);
                for u in users {
                    table.add_row(vec![
                        Cell::new(u.id),
                        Cell::new(&u.name),
                        Cell::new(&u.email),
                        Cell::new(u.specialty().unwrap_or_default()),
                    ]);
                }
            }
        }
        writeln!(self.out, "\n{table}")
    }

    fn show_roster(&mut self) -> io::Result<()> {
        let Some((course_id, course_name)) = self.select_course()? else {
            return Ok(());
        };
        let Some(roster) = report(&mut self.out, self.registry.course_roster(course_id))? else {
            return Ok(());
        };

        writeln!(self.out, "\n--- STUDENTS IN {course_name} ---")?;
        if roster.is_empty() {
            return writeln!(self.out, "No students enrolled in this course.");
        }
        let mut table = Table::new();
        table.set_header(vec!["ID", "Name", "Email", "Average"]);
        for (student, average) in roster {
            table.add_row(vec![
                Cell::new(student.id),
                Cell::new(&student.name),
                Cell::new(&student.email),
                Cell::new(format!("{average:.2}")),
            ]);
        }
        writeln!(self.out, "{table}")
    }

    fn show_assessments(&mut self) -> io::Result<()> {
        let Some((course_id, course_name)) = self.select_course()? else {
            return Ok(());
        };
        let result = self.registry.assessments_for_course(course_id);
        let Some(assessments) = report(&mut self.out, result)? else {
            return Ok(());
        };

        writeln!(self.out, "\n--- ASSESSMENTS OF {course_name} ---")?;
        if assessments.is_empty() {
            return writeln!(self.out, "No assessments for this course.");
        }
        let mut table = Table::new();
        table.set_header(vec!["ID", "Name", "Kind", "Max score", "Details", "Graded"]);
        for a in assessments {
            table.add_row(vec![
                Cell::new(a.id),
                Cell::new(&a.name),
                Cell::new(a.kind_name()),
                Cell::new(a.max_score),
                Cell::new(describe_detail(a)),
                Cell::new(a.scores.len()),
            ]);
        }
        writeln!(self.out, "{table}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_script(script: &str) -> String {
        let mut out = Vec::new();
        Menu::new(Registry::new(), script.as_bytes(), &mut out, 60.0)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    const SETUP: &str = "1\ninstructor\nA\na@x\n\
                         1\nstudent\nB\nb@x\n\
                         2\n1\nX\n\
                         3\n1\n1\n\
                         4\n1\nexam\nMidterm\n100\n\n";

    #[test]
    fn exit_option_ends_loop() {
        let out = run_script("8\n");
        assert!(out.contains("COURSEBOOK"));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn end_of_input_ends_loop() {
        let out = run_script("");
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn invalid_option_keeps_looping() {
        let out = run_script("42\n8\n");
        assert!(out.contains("Invalid option. Try again."));
        assert_eq!(out.matches("1. Register user").count(), 2);
    }

    #[test]
    fn full_flow_reports_low_average() {
        let script = format!("{SETUP}5\n1\n1\n1\n45\n7\n1\n\n8\n");
        let out = run_script(&script);

        assert!(out.contains("User registered: Instructor: A (a@x) (ID: 1)"));
        assert!(out.contains("User registered: Student: B (b@x) (ID: 2)"));
        assert!(out.contains("Course created: X (ID: 1)"));
        assert!(out.contains("Student B enrolled in course X"));
        assert!(out.contains("Assessment created: Midterm (ID: 1)"));
        assert!(out.contains("Grade recorded for B on Midterm"));
        assert!(out.contains("1. B (b@x) - average: 45.00"));
    }

    #[test]
    fn registry_errors_are_printed_and_loop_continues() {
        let script = "1\nstudent\nB\nb@x\n1\ninstructor\nC\nb@x\n8\n";
        let out = run_script(script);
        assert!(out.contains("Error: email b@x is already registered"));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn duplicate_enrollment_is_reported() {
        let script = format!("{SETUP}3\n1\n1\n8\n");
        let out = run_script(&script);
        assert!(out.contains("Error: student 2 is already enrolled in course 1"));
    }

    #[test]
    fn out_of_range_score_is_reported() {
        let script = format!("{SETUP}5\n1\n1\n1\n100.01\n8\n");
        let out = run_script(&script);
        assert!(out.contains("Error: score 100.01 is out of range (0 to 100)"));
        assert!(!out.contains("Grade recorded"));
    }

    #[test]
    fn unknown_kind_is_rejected_before_prompting_further() {
        let out = run_script("1\nadmin\n8\n");
        assert!(out.contains("Error: unknown user kind: admin"));
        assert!(!out.contains("Name: "));
    }

    #[test]
    fn create_course_without_instructors() {
        let out = run_script("2\n8\n");
        assert!(out.contains("No instructors registered."));
    }

    #[test]
    fn selection_out_of_range() {
        let out = run_script("1\ninstructor\nA\na@x\n2\n5\n8\n");
        assert!(out.contains("Invalid selection"));
        assert!(!out.contains("Course created"));
    }

    #[test]
    fn non_numeric_selection() {
        let out = run_script("1\ninstructor\nA\na@x\n2\nfirst\n8\n");
        assert!(out.contains("Error: 'first' is not a valid number"));
    }

    #[test]
    fn assignment_with_due_date_shows_in_queries() {
        let script = "1\ninstructor\nA\na@x\n2\n1\nX\n\
                      4\n1\nassignment\nEssay\n10\n2026-05-01\n\
                      6\n5\n1\n6\n8\n";
        let out = run_script(script);
        assert!(out.contains("Assessment created: Essay (ID: 1)"));
        assert!(out.contains("due 2026-05-01"));
    }

    #[test]
    fn bad_due_date_is_rejected() {
        let script = "1\ninstructor\nA\na@x\n2\n1\nX\n4\n1\nassignment\nEssay\n10\nMay 1\n8\n";
        let out = run_script(script);
        assert!(out.contains("Error: due date must look like YYYY-MM-DD"));
        assert!(!out.contains("Assessment created"));
    }

    #[test]
    fn queries_list_courses_and_roster() {
        let script = format!("{SETUP}5\n1\n1\n1\n80\n6\n1\n2\n3\n4\n1\n6\n8\n");
        let out = run_script(&script);
        assert!(out.contains("QUERIES"));
        assert!(out.contains("Assessments"));
        assert!(out.contains("General"));
        assert!(out.contains("STUDENTS IN X"));
        assert!(out.contains("80.00"));
    }

    #[test]
    fn report_with_custom_threshold() {
        let script = format!("{SETUP}5\n1\n1\n1\n45\n7\n1\n40\n8\n");
        let out = run_script(&script);
        assert!(out.contains("No students average below 40 in this course."));
    }

    #[test]
    fn report_rejects_nan_and_negative_thresholds() {
        for bad in ["NaN", "-5"] {
            let script = format!("{SETUP}7\n1\n{bad}\n8\n");
            let out = run_script(&script);
            assert!(
                out.contains("Error: threshold must be a non-negative number"),
                "{bad}: {out}"
            );
            assert!(!out.contains("Students below"), "{bad}: {out}");
        }
    }

    #[test]
    fn due_date_parsing() {
        let due = parse_due_date("2026-05-01").unwrap();
        assert_eq!(due.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-05-01 23:59:59");
        assert!(parse_due_date("2026-13-01").is_none());
        assert!(parse_due_date("").is_none());
    }
}
