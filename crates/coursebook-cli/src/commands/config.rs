//! The `coursebook config` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use coursebook_core::config::CoursebookConfig;

pub fn execute(config: &CoursebookConfig, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        "text" => {
            let mut table = Table::new();
            table.set_header(vec!["Setting", "Value"]);
            table.add_row(vec![
                Cell::new("low_average_threshold"),
                Cell::new(config.low_average_threshold),
            ]);
            table.add_row(vec![
                Cell::new("default_time_limit_minutes"),
                Cell::new(config.registry.default_time_limit_minutes),
            ]);
            table.add_row(vec![
                Cell::new("default_specialty"),
                Cell::new(&config.registry.default_specialty),
            ]);
            table.add_row(vec![Cell::new("log_level"), Cell::new(&config.log_level)]);
            println!("{table}");
        }
        other => anyhow::bail!("unknown format: '{other}' (expected text or json)"),
    }

    Ok(())
}
