use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Mapping from page name to the absolute path of that page's entry script.
///
/// A BTreeMap keeps iteration order stable, so repeated discovery runs over
/// an unchanged tree serialize to identical output.
pub type EntryMap = BTreeMap<String, PathBuf>;

/// Where generated script/style tags are injected into a page template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectPosition {
    Head,
    Body,
}

/// HTML minification flag set applied to each generated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlMinifyOptions {
    pub html5: bool,
    pub remove_redundant_attributes: bool,
    pub collapse_whitespace: bool,
    pub remove_attribute_quotes: bool,
    pub remove_comments: bool,
    pub collapse_boolean_attributes: bool,
}

impl Default for HtmlMinifyOptions {
    fn default() -> Self {
        HtmlMinifyOptions {
            html5: true,
            remove_redundant_attributes: true,
            collapse_whitespace: true,
            remove_attribute_quotes: true,
            remove_comments: true,
            collapse_boolean_attributes: true,
        }
    }
}

/// Per-page HTML generation descriptor consumed by the bundling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    /// Logical page name, derived from the page's directory name.
    pub name: String,
    /// Path to the page's HTML template.
    pub template: PathBuf,
    /// Output filename, relative to the bundle output directory.
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<PathBuf>,
    /// Chunks injected into this page, in load order. The shared vendor
    /// chunk comes first: page code depends on it having executed.
    pub chunks: Vec<String>,
    pub inject: InjectPosition,
    pub minify: HtmlMinifyOptions,
}

impl PageDescriptor {
    /// Output filename for a page, e.g. "home" -> "home.html"
    pub fn output_filename(name: &str) -> String {
        format!("{}.html", name)
    }
}

/// Result of scanning a project for page entry points.
///
/// Computed once per invocation from the filesystem snapshot and not
/// mutated afterward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveredPages {
    /// Page name -> entry script path.
    pub entries: EntryMap,
    /// One descriptor per discovered page, ordered by page name.
    pub pages: Vec<PageDescriptor>,
    /// Paths under the pages directory that did not match the
    /// `<name>/index.js` convention. Tolerated, but surfaced as warnings.
    pub skipped: Vec<PathBuf>,
}

impl DiscoveredPages {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}
