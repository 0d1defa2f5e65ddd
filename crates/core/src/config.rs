use crate::error::{Error, Result};
use crate::types::HtmlMinifyOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mpa.toml";

/// Raw TOML configuration structure
/// This matches the mpa.toml file structure exactly; every field is
/// optional so a partial (or absent) file falls back to the defaults.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    build: RawBuild,
    #[serde(default)]
    chunks: RawChunks,
    #[serde(default)]
    minify: RawMinify,
    globals: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    source_dir: Option<String>,
    output_dir: Option<String>,
    pages_dir: Option<String>,
    static_dir: Option<String>,
    favicon: Option<String>,
    alias: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawChunks {
    vendor_name: Option<String>,
    common_name: Option<String>,
    min_shared: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMinify {
    enabled: Option<bool>,
    html5: Option<bool>,
    remove_redundant_attributes: Option<bool>,
    collapse_whitespace: Option<bool>,
    remove_attribute_quotes: Option<bool>,
    remove_comments: Option<bool>,
    collapse_boolean_attributes: Option<bool>,
}

/// Chunk naming and extraction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Name of the shared vendor chunk injected before each page chunk.
    pub vendor_name: String,
    /// Name of the extracted common chunk (may contain a subdirectory,
    /// e.g. "common/common").
    pub common_name: String,
    /// Minimum number of page entries that must reference a module before
    /// it is extracted into the common chunk.
    pub min_shared: u32,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        ChunkConfig {
            vendor_name: "vendors".to_string(),
            common_name: "common/common".to_string(),
            min_shared: 2,
        }
    }
}

/// Minification settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinifyConfig {
    pub enabled: bool,
    pub html: HtmlMinifyOptions,
}

/// Project build configuration, loaded from mpa.toml.
///
/// All directory fields are relative: `source_dir` and `output_dir` to the
/// project root, `pages_dir`/`static_dir`/`favicon` to the source directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pages_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Shared favicon, injected into every page when the file exists.
    pub favicon: Option<PathBuf>,
    /// Import alias map, values relative to the project root.
    pub alias: BTreeMap<String, PathBuf>,
    /// Free identifiers shimmed to module imports in every bundle
    /// (e.g. `$` -> "jquery").
    pub globals: BTreeMap<String, String>,
    pub chunks: ChunkConfig,
    pub minify: MinifyConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let mut alias = BTreeMap::new();
        alias.insert("@".to_string(), PathBuf::from("src"));
        let mut globals = BTreeMap::new();
        globals.insert("$".to_string(), "jquery".to_string());
        globals.insert("jQuery".to_string(), "jquery".to_string());
        globals.insert("window.jQuery".to_string(), "jquery".to_string());
        BuildConfig {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("dist"),
            pages_dir: PathBuf::from("pages"),
            static_dir: PathBuf::from("static"),
            favicon: Some(PathBuf::from("static/favicon.ico")),
            alias,
            globals,
            chunks: ChunkConfig::default(),
            minify: MinifyConfig {
                enabled: true,
                html: HtmlMinifyOptions::default(),
            },
        }
    }
}

impl BuildConfig {
    /// Absolute path to the pages directory for a given project root.
    pub fn pages_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.source_dir).join(&self.pages_dir)
    }

    /// Absolute path to the static asset directory for a given project root.
    pub fn static_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.source_dir).join(&self.static_dir)
    }

    /// Absolute path to the bundle output directory for a given project root.
    pub fn output_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.output_dir)
    }
}

/// Load mpa.toml from a project root directory.
///
/// A missing config file is not an error: the project then uses the
/// default layout (src/, dist/, pages under src/pages).
pub fn load_build_config<P: AsRef<Path>>(project_root: P) -> Result<BuildConfig> {
    let config_path = project_root.as_ref().join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(BuildConfig::default());
    }
    let content = fs::read_to_string(&config_path)?;
    parse_build_config_str(&content)
}

/// Parse mpa.toml from a string (useful for testing)
pub fn parse_build_config_str(content: &str) -> Result<BuildConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    let defaults = BuildConfig::default();

    let source_dir = resolve_dir(raw.build.source_dir, defaults.source_dir, "build.source_dir")?;
    let output_dir = resolve_dir(raw.build.output_dir, defaults.output_dir, "build.output_dir")?;
    let pages_dir = resolve_dir(raw.build.pages_dir, defaults.pages_dir, "build.pages_dir")?;
    let static_dir = resolve_dir(raw.build.static_dir, defaults.static_dir, "build.static_dir")?;

    let favicon = match raw.build.favicon {
        Some(path) => Some(validate_path(&path, "build.favicon")?),
        None => defaults.favicon,
    };

    let alias = match raw.build.alias {
        Some(raw_alias) => {
            let mut alias = BTreeMap::new();
            for (name, target) in raw_alias {
                if name.trim().is_empty() {
                    return Err(Error::ConfigParse(
                        "Empty alias name in 'build.alias'".to_string(),
                    ));
                }
                alias.insert(name, validate_path(&target, "build.alias")?);
            }
            alias
        }
        None => defaults.alias,
    };

    let globals = raw.globals.unwrap_or(defaults.globals);

    let chunk_defaults = ChunkConfig::default();
    let chunks = ChunkConfig {
        vendor_name: raw
            .chunks
            .vendor_name
            .unwrap_or(chunk_defaults.vendor_name),
        common_name: raw
            .chunks
            .common_name
            .unwrap_or(chunk_defaults.common_name),
        min_shared: raw.chunks.min_shared.unwrap_or(chunk_defaults.min_shared),
    };
    if chunks.vendor_name.trim().is_empty() {
        return Err(Error::ConfigParse(
            "Empty chunk name in 'chunks.vendor_name'".to_string(),
        ));
    }
    if chunks.common_name.trim().is_empty() {
        return Err(Error::ConfigParse(
            "Empty chunk name in 'chunks.common_name'".to_string(),
        ));
    }
    if chunks.min_shared < 1 {
        return Err(Error::ConfigParse(format!(
            "'chunks.min_shared' must be at least 1, got {}",
            chunks.min_shared
        )));
    }

    let html_defaults = HtmlMinifyOptions::default();
    let minify = MinifyConfig {
        enabled: raw.minify.enabled.unwrap_or(true),
        html: HtmlMinifyOptions {
            html5: raw.minify.html5.unwrap_or(html_defaults.html5),
            remove_redundant_attributes: raw
                .minify
                .remove_redundant_attributes
                .unwrap_or(html_defaults.remove_redundant_attributes),
            collapse_whitespace: raw
                .minify
                .collapse_whitespace
                .unwrap_or(html_defaults.collapse_whitespace),
            remove_attribute_quotes: raw
                .minify
                .remove_attribute_quotes
                .unwrap_or(html_defaults.remove_attribute_quotes),
            remove_comments: raw
                .minify
                .remove_comments
                .unwrap_or(html_defaults.remove_comments),
            collapse_boolean_attributes: raw
                .minify
                .collapse_boolean_attributes
                .unwrap_or(html_defaults.collapse_boolean_attributes),
        },
    };

    Ok(BuildConfig {
        source_dir,
        output_dir,
        pages_dir,
        static_dir,
        favicon,
        alias,
        globals,
        chunks,
        minify,
    })
}

fn resolve_dir(raw: Option<String>, default: PathBuf, field_name: &str) -> Result<PathBuf> {
    match raw {
        Some(path) => validate_path(&path, field_name),
        None => Ok(default),
    }
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and paths containing parent directory
/// references (`..`) so a project config cannot point the scanner or the
/// output writer outside the project directory.
///
/// # Arguments
///
/// * `path_str` - The path string from user input (mpa.toml)
/// * `field_name` - Name of the field for error messages
///
/// # Returns
///
/// A validated relative PathBuf, or an error if the path is unsafe
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    // Reject absolute paths
    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    // Check for parent directory references
    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    // Ensure path is not empty
    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_valid_relative() {
        assert!(validate_path("src", "build.source_dir").is_ok());
        assert!(validate_path("static/favicon.ico", "build.favicon").is_ok());
        assert!(validate_path("nested/output/dir", "build.output_dir").is_ok());
    }

    #[test]
    fn test_validate_path_rejects_absolute() {
        let result = validate_path("/etc/passwd", "build.source_dir");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Absolute paths not allowed")
        );
    }

    #[test]
    fn test_validate_path_rejects_parent_dir() {
        let result = validate_path("../outside", "build.output_dir");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );

        let result = validate_path("src/../../escape", "build.source_dir");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_path_rejects_empty() {
        let result = validate_path("", "build.favicon");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Empty path"));
    }

    #[test]
    fn test_validate_path_field_name_in_error() {
        let result = validate_path("/abs", "build.pages_dir");
        assert!(result.unwrap_err().to_string().contains("build.pages_dir"));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = parse_build_config_str("").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.source_dir, PathBuf::from("src"));
        assert_eq!(config.output_dir, PathBuf::from("dist"));
        assert_eq!(config.pages_dir, PathBuf::from("pages"));
        assert_eq!(config.chunks.vendor_name, "vendors");
        assert_eq!(config.chunks.common_name, "common/common");
        assert_eq!(config.chunks.min_shared, 2);
        assert!(config.minify.enabled);
        assert_eq!(config.alias.get("@"), Some(&PathBuf::from("src")));
        assert_eq!(config.globals.get("$"), Some(&"jquery".to_string()));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[build]
source_dir = "app"
output_dir = "build"
pages_dir = "views"
static_dir = "assets"
favicon = "assets/icon.ico"

[build.alias]
"@" = "app"
"~components" = "app/components"

[chunks]
vendor_name = "shared"
common_name = "common"
min_shared = 3

[globals]
"_" = "lodash"

[minify]
enabled = false
remove_comments = false
        "##;

        let config = parse_build_config_str(toml).unwrap();
        assert_eq!(config.source_dir, PathBuf::from("app"));
        assert_eq!(config.output_dir, PathBuf::from("build"));
        assert_eq!(config.pages_dir, PathBuf::from("views"));
        assert_eq!(config.static_dir, PathBuf::from("assets"));
        assert_eq!(config.favicon, Some(PathBuf::from("assets/icon.ico")));
        assert_eq!(
            config.alias.get("~components"),
            Some(&PathBuf::from("app/components"))
        );
        assert_eq!(config.chunks.vendor_name, "shared");
        assert_eq!(config.chunks.min_shared, 3);
        assert_eq!(config.globals.get("_"), Some(&"lodash".to_string()));
        assert!(!config.globals.contains_key("$"), "overriding replaces the default globals");
        assert!(!config.minify.enabled);
        assert!(!config.minify.html.remove_comments);
        // Flags not mentioned keep their defaults
        assert!(config.minify.html.collapse_whitespace);
    }

    #[test]
    fn test_parse_config_rejects_absolute_source_dir() {
        let toml = r##"
[build]
source_dir = "/usr/share/app"
        "##;
        let result = parse_build_config_str(toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Absolute paths not allowed")
        );
    }

    #[test]
    fn test_parse_config_rejects_traversal_in_favicon() {
        let toml = r##"
[build]
favicon = "../../etc/shadow"
        "##;
        let result = parse_build_config_str(toml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Parent directory references")
        );
    }

    #[test]
    fn test_parse_config_rejects_traversal_in_alias() {
        let toml = r##"
[build.alias]
"@" = "../outside"
        "##;
        assert!(parse_build_config_str(toml).is_err());
    }

    #[test]
    fn test_parse_config_rejects_empty_chunk_names() {
        let toml = r##"
[chunks]
vendor_name = ""
        "##;
        let result = parse_build_config_str(toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("vendor_name"));

        let toml = r##"
[chunks]
common_name = ""
        "##;
        let result = parse_build_config_str(toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("common_name"));
    }

    #[test]
    fn test_parse_config_rejects_zero_min_shared() {
        let toml = r##"
[chunks]
min_shared = 0
        "##;
        let result = parse_build_config_str(toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("min_shared"));
    }

    #[test]
    fn test_path_helpers() {
        let config = BuildConfig::default();
        let root = Path::new("/project");
        assert_eq!(config.pages_root(root), PathBuf::from("/project/src/pages"));
        assert_eq!(
            config.static_root(root),
            PathBuf::from("/project/src/static")
        );
        assert_eq!(config.output_root(root), PathBuf::from("/project/dist"));
    }

    #[test]
    fn test_load_missing_config_is_defaults() {
        // A directory with no mpa.toml loads the default layout.
        let dir = tempfile::TempDir::new().unwrap();
        let config = load_build_config(dir.path()).unwrap();
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[build]\noutput_dir = \"public\"\n",
        )
        .unwrap();
        let config = load_build_config(dir.path()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("public"));
    }
}
