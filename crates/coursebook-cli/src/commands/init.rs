//! The `coursebook init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    let path = std::path::Path::new("coursebook.toml");
    if path.exists() {
        println!("coursebook.toml already exists, skipping.");
    } else {
        std::fs::write(path, SAMPLE_CONFIG)?;
        println!("Created coursebook.toml");
    }

    println!("\nNext steps:");
    println!("  1. Adjust the defaults in coursebook.toml");
    println!("  2. Run: coursebook config");
    println!("  3. Run: coursebook menu");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# coursebook configuration

# Cutoff offered by the low-average report. Compared against the raw
# average of recorded scores, on the same scale as each assessment's
# max score. Override with COURSEBOOK_THRESHOLD.
low_average_threshold = 60.0

# Time limit for exams created without one, in minutes.
default_time_limit_minutes = 60

# Specialty given to newly registered instructors.
default_specialty = "General"

# Log level for coursebook (RUST_LOG takes precedence).
log_level = "warn"
"#;
