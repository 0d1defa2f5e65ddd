use anyhow::{Context, Result};
use chrono::Local;
use mpa_kit_core::config::CONFIG_FILE;
use std::fs;
use std::path::{Path, PathBuf};

const STARTER_PAGE: &str = "home";

/// Initialize a new multi-page project directory.
///
/// Creates the conventional layout discovery expects:
/// - `src/pages/home/` with a starter entry script and HTML template
/// - `src/static/` for assets copied verbatim into the build output
/// - a commented `mpa.toml` with the default settings spelled out
///
/// # Errors
///
/// Returns an error if the directory doesn't exist, if `mpa.toml` is
/// already present, or if file operations fail.
pub async fn run(path: PathBuf) -> Result<()> {
    println!("Initializing project directory: {}", path.display());

    if !path.exists() {
        anyhow::bail!(
            "Directory '{}' does not exist. Create it first: mkdir {}",
            path.display(),
            path.display()
        );
    }

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists at {}\nHint: Delete it first or use a different directory",
            CONFIG_FILE,
            config_path.display()
        );
    }

    create_directory_structure(&path)?;
    generate_starter_page(&path, STARTER_PAGE)?;
    generate_config(&path)?;

    println!("\n✓ Initialization complete!");
    println!("\nGenerated structure:");
    println!("  {}/", path.display());
    println!("  ├── mpa.toml              ← Build settings (defaults spelled out)");
    println!("  └── src/");
    println!("      ├── pages/");
    println!("      │   └── {}/", STARTER_PAGE);
    println!("      │       ├── index.js");
    println!("      │       └── index.html");
    println!("      └── static/           ← Copied verbatim into the output");

    println!("\nNext steps:");
    println!("  1. Add more pages as src/pages/<name>/index.js + index.html");
    println!("  2. Check the layout: mpa-kit validate {}", path.display());
    println!("  3. Write the plan:  mpa-kit plan {}", path.display());

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    fs::create_dir_all(base.join("src").join("pages"))?;
    fs::create_dir_all(base.join("src").join("static"))?;
    Ok(())
}

fn generate_starter_page(base: &Path, name: &str) -> Result<()> {
    let page_dir = base.join("src").join("pages").join(name);
    fs::create_dir_all(&page_dir)?;

    let script = format!(
        "// Entry script for the '{name}' page.\n\
         // Everything imported from here ends up in the '{name}' chunk;\n\
         // modules shared with other pages are split into the common chunk.\n\
         document.addEventListener('DOMContentLoaded', () => {{\n\
         \x20 document.querySelector('#app').textContent = '{name}';\n\
         }});\n"
    );
    fs::write(page_dir.join("index.js"), script).context("Failed to write starter entry script")?;

    let template = format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         \x20 <meta charset=\"UTF-8\">\n\
         \x20 <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         \x20 <title>{name}</title>\n\
         </head>\n\
         <body>\n\
         \x20 <div id=\"app\"></div>\n\
         </body>\n\
         </html>\n"
    );
    fs::write(page_dir.join("index.html"), template).context("Failed to write starter template")?;

    Ok(())
}

fn generate_config(base: &Path) -> Result<()> {
    let today = Local::now().format("%Y-%m-%d").to_string();

    let toml = format!(
        r##"# Generated by mpa-kit init on {today}
# Every setting below is the default; edit what you need.

[build]
source_dir = "src"
output_dir = "dist"
pages_dir = "pages"      # relative to source_dir
static_dir = "static"    # relative to source_dir
favicon = "static/favicon.ico"  # injected into every page when present

[build.alias]
"@" = "src"

[chunks]
vendor_name = "vendors"       # shared chunk injected before each page chunk
common_name = "common/common" # extracted common chunk (path inside output)
min_shared = 2                # pages that must share a module to extract it

[minify]
enabled = true
html5 = true
remove_redundant_attributes = true
collapse_whitespace = true
remove_attribute_quotes = true
remove_comments = true
collapse_boolean_attributes = true
"##
    );

    // Re-parse what we just wrote; a template that does not parse is a bug
    // in this generator, not a user error.
    toml::from_str::<toml::Value>(&toml)
        .context("Generated TOML is invalid - this is a bug in the template generator")?;

    fs::write(base.join(CONFIG_FILE), toml)?;

    Ok(())
}
