//! Generate command - write a synthetic labelled dataset

use std::path::Path;

use anyhow::Result;
use flux_core::services::{DataGenerator, GeneratorOptions};

use crate::output;

pub fn run(rows: usize, users: usize, seed: u64, path: &Path, json: bool) -> Result<()> {
    let generator = DataGenerator::new(GeneratorOptions {
        rows,
        users,
        seed,
        ..Default::default()
    });
    let summary = generator.write_to_path(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    output::success(&format!(
        "Wrote {} rows for {} users to {}",
        summary.rows,
        summary.users,
        path.display()
    ));

    let mut table = output::create_table();
    table.set_header(vec!["Class", "Rows"]);
    table.add_row(vec!["Normal".to_string(), summary.normal.to_string()]);
    table.add_row(vec!["Suspicious".to_string(), summary.suspicious.to_string()]);
    table.add_row(vec!["Compromised".to_string(), summary.compromised.to_string()]);
    println!("{}", table);
    output::info(&format!("{} rows labelled as attacks", summary.attacks()));
    Ok(())
}
