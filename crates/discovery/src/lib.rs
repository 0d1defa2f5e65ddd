//! Page entry discovery and project validation.
//!
//! A multi-page project keeps one directory per page under the pages
//! directory, with the page's entry script and HTML template co-located:
//!
//! ```text
//! <project>/src/pages/<name>/index.js    entry script
//! <project>/src/pages/<name>/index.html  template
//! ```
//!
//! Discovery is a single synchronous read-only pass over that tree. The
//! result is a pure function of the filesystem snapshot at call time.

use mpa_kit_core::{
    BuildConfig, DiscoveredPages, Error, InjectPosition, PageDescriptor, Result,
};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Entry script filename expected in each page directory.
pub const ENTRY_FILE: &str = "index.js";
/// HTML template filename expected in each page directory.
pub const TEMPLATE_FILE: &str = "index.html";

/// Scan a project for page entry points.
///
/// Walks `<root>/<source_dir>/<pages_dir>` and collects every immediate
/// subdirectory containing an `index.js`. Each match becomes one entry in
/// the returned map and one [`PageDescriptor`]. Paths under the pages
/// directory that do not match the convention are excluded and recorded in
/// `skipped` rather than failing the scan.
///
/// A missing pages directory yields an empty result; a missing or
/// unreadable project root is an error and produces no partial result.
pub fn discover_pages(project_root: &Path, config: &BuildConfig) -> Result<DiscoveredPages> {
    let metadata = fs::metadata(project_root)?;
    if !metadata.is_dir() {
        return Err(Error::InvalidData(format!(
            "Project root is not a directory: {}",
            project_root.display()
        )));
    }
    // Canonicalize so entry paths in the plan are absolute regardless of
    // how the caller spelled the root.
    let project_root = project_root.canonicalize()?;
    // A root we cannot read is a hard error; a merely absent pages tree
    // below a readable root is an empty project. `is_dir()` would swallow
    // the first case into the second, so check them apart.
    fs::read_dir(&project_root)?;

    let pages_root = config.pages_root(&project_root);
    match fs::metadata(&pages_root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(DiscoveredPages::default()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(DiscoveredPages::default());
        }
        Err(e) => return Err(e.into()),
    }

    let favicon = resolve_favicon(&project_root, config);

    let mut discovered = DiscoveredPages::default();

    for entry in WalkDir::new(&pages_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Filesystem(e.into()))?;

        if !entry.file_type().is_dir() {
            // Stray file at the pages level, e.g. src/pages/readme.md
            discovered.skipped.push(entry.path().to_path_buf());
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            discovered.skipped.push(entry.path().to_path_buf());
            continue;
        };

        let entry_script = entry.path().join(ENTRY_FILE);
        if !entry_script.is_file() {
            discovered.skipped.push(entry.path().to_path_buf());
            continue;
        }

        discovered.pages.push(PageDescriptor {
            name: name.clone(),
            template: entry.path().join(TEMPLATE_FILE),
            filename: PageDescriptor::output_filename(&name),
            favicon: favicon.clone(),
            // Vendor chunk first: shared code must execute before page code.
            chunks: vec![config.chunks.vendor_name.clone(), name.clone()],
            inject: InjectPosition::Body,
            minify: config.minify.html.clone(),
        });
        discovered.entries.insert(name, entry_script);
    }

    Ok(discovered)
}

/// Favicon path for injection, only when the configured file exists.
fn resolve_favicon(project_root: &Path, config: &BuildConfig) -> Option<PathBuf> {
    let relative = config.favicon.as_ref()?;
    let path = project_root.join(&config.source_dir).join(relative);
    path.is_file().then_some(path)
}

/// Outcome of a full project check: fatal problems, tolerable oddities,
/// and per-page summary lines.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a project's page layout.
///
/// Runs discovery, then checks that every discovered page has its HTML
/// template next to the entry script. Skipped paths and an empty project
/// are reported as warnings, not errors.
pub fn validate_project(project_root: &Path, config: &BuildConfig) -> Result<ValidationReport> {
    let discovered = discover_pages(project_root, config)?;
    let mut report = ValidationReport::default();

    for page in &discovered.pages {
        if page.template.is_file() {
            report.info.push(format!(
                "page '{}': template {}",
                page.name,
                page.template.display()
            ));
        } else {
            report.errors.push(format!(
                "page '{}' has no template: expected {}",
                page.name,
                page.template.display()
            ));
        }
    }

    for skipped in &discovered.skipped {
        report.warnings.push(format!(
            "ignored (does not match <name>/{}): {}",
            ENTRY_FILE,
            skipped.display()
        ));
    }

    if discovered.is_empty() {
        report.warnings.push(format!(
            "no pages found under {}",
            config.pages_root(project_root).display()
        ));
    }

    if let Some(relative) = &config.favicon {
        let path = project_root.join(&config.source_dir).join(relative);
        if !path.is_file() {
            report.warnings.push(format!(
                "configured favicon not found: {} (pages will be generated without one)",
                path.display()
            ));
        }
    }

    Ok(report)
}
