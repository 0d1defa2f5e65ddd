use anyhow::{Context, Result};
use mpa_kit_core::config::{CONFIG_FILE, load_build_config};
use mpa_kit_discovery::discover_pages;
use mpa_kit_generator::{PLAN_FILE, generate_plan, write_plan};
use std::path::PathBuf;

/// Discover pages and write the bundle plan
pub async fn run(path: PathBuf, out: Option<PathBuf>) -> Result<()> {
    println!("🔨 Planning bundle...");
    println!("   Project: {}", path.display());
    println!();

    if !path.exists() {
        anyhow::bail!(
            "Project directory does not exist: {}\nRun 'mpa-kit init {}' first",
            path.display(),
            path.display()
        );
    }

    // Discovery resolves the root before walking it, so entry paths come
    // back absolute. The rest of the plan has to agree no matter how the
    // caller spelled the path, so resolve it once here and use that root
    // everywhere.
    let root = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    let config = load_build_config(&root)
        .with_context(|| format!("Failed to load {}", root.join(CONFIG_FILE).display()))?;

    let discovered = discover_pages(&root, &config).context("Page discovery failed")?;

    if discovered.is_empty() {
        println!(
            "⚠ No pages found under {}",
            config.pages_root(&root).display()
        );
        println!(
            "  Expected layout: {}/<name>/index.js",
            config.pages_root(&root).display()
        );
    } else {
        println!("✓ Discovered {} page(s):", discovered.page_count());
        for page in &discovered.pages {
            println!("   {} -> {}", page.name, page.filename);
        }
    }

    for skipped in &discovered.skipped {
        eprintln!("   ⚠ Warning: ignored non-page path: {}", skipped.display());
    }

    println!();
    println!("📄 Generating bundle plan...");
    let plan = generate_plan(&root, &config, &discovered);
    println!("   ✓ {} entry point(s)", plan.entry.len());
    println!("   ✓ {} asset rule(s)", plan.rules.len());
    println!(
        "   ✓ common chunk '{}' (min shared: {})",
        plan.optimization.split_chunks.name, plan.optimization.split_chunks.min_chunks
    );

    let out_path = out.unwrap_or_else(|| root.join(PLAN_FILE));
    write_plan(&plan, &out_path)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    println!();
    println!("✅ Plan written to {}", out_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_relative_root_yields_absolute_plan_paths() {
        let out_dir = TempDir::new().unwrap();
        let out_path = out_dir.path().join("bundle.plan.json");

        // "." is this crate's directory when tests run. It has no pages
        // tree, which is fine: the plan must still come out with
        // absolute output, alias, and static-copy paths.
        run(PathBuf::from("."), Some(out_path.clone()))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&out_path).unwrap();
        let plan: serde_json::Value = serde_json::from_str(&content).unwrap();

        let output_path = plan["output"]["path"].as_str().unwrap();
        assert!(
            Path::new(output_path).is_absolute(),
            "output.path should be absolute, got {output_path}"
        );

        let alias = plan["resolve"]["alias"]["@"].as_str().unwrap();
        assert!(Path::new(alias).is_absolute());
    }
}
