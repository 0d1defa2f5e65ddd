use anyhow::{Context, Result};
use mpa_kit_core::config::load_build_config;
use mpa_kit_discovery::validate_project;
use std::path::PathBuf;

pub async fn run(path: PathBuf) -> Result<()> {
    println!("Validating project at: {}", path.display());

    let config = load_build_config(&path).context("Failed to load project config")?;
    let report = validate_project(&path, &config).context("Validation failed to run")?;

    for line in &report.info {
        println!("✓ {}", line);
    }
    for warning in &report.warnings {
        println!("⚠ {}", warning);
    }
    for error in &report.errors {
        eprintln!("✗ {}", error);
    }

    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    println!("\n✓ Project layout is valid");
    Ok(())
}
