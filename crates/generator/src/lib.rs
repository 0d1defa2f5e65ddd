//! Bundler plan assembly.
//!
//! Turns a project's configuration and its discovered pages into a
//! complete bundle plan: entry map, output layout, asset rules, per-page
//! HTML descriptors, plugin settings, and chunk-splitting/minification
//! options. The plan is serialized as JSON and handed to the external
//! bundling engine; nothing here bundles, transpiles, or minifies.

use mpa_kit_core::{BuildConfig, DiscoveredPages, EntryMap, Error, PageDescriptor, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default filename for the emitted plan.
pub const PLAN_FILE: &str = "bundle.plan.json";

/// Output chunk filename pattern for page scripts.
const SCRIPT_FILENAME: &str = "js/[name].js";
/// Output filename pattern for extracted stylesheets.
const CSS_FILENAME: &str = "css/[name].css";

/// Complete build plan for one invocation of the bundling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlePlan {
    pub resolve: ResolveSettings,
    pub entry: EntryMap,
    pub output: OutputSettings,
    pub rules: Vec<AssetRule>,
    pub pages: Vec<PageDescriptor>,
    pub plugins: Vec<PluginSpec>,
    pub optimization: Optimization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveSettings {
    /// Import alias -> absolute directory path.
    pub alias: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    /// Absolute output directory for all emitted files.
    pub path: PathBuf,
    /// Filename pattern for entry chunks, relative to `path`.
    pub filename: String,
}

/// One loader rule: which files it matches and the loader chain applied
/// to them. Loaders run in the listed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRule {
    /// Regex matched against the file path.
    pub test: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    pub loaders: Vec<Loader>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loader {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub options: BTreeMap<String, Value>,
}

impl Loader {
    fn bare(name: &str) -> Self {
        Loader {
            name: name.to_string(),
            options: BTreeMap::new(),
        }
    }

    fn with_options(name: &str, options: &[(&str, Value)]) -> Self {
        Loader {
            name: name.to_string(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "camelCase")]
pub enum PluginSpec {
    /// Shim free identifiers to module imports in every bundle.
    #[serde(rename_all = "camelCase")]
    ProvideGlobals { definitions: BTreeMap<String, String> },
    /// Extract styles into standalone css chunks.
    #[serde(rename_all = "camelCase")]
    ExtractCss { filename: String },
    /// Copy the static asset directory into the output root verbatim.
    #[serde(rename_all = "camelCase")]
    CopyStatic { from: PathBuf },
    /// Wipe the output directory before emitting.
    CleanOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub split_chunks: SplitChunks,
    pub minimize: bool,
    pub minimizers: Vec<MinimizerSpec>,
}

/// Settings for extracting code shared between page entries into a
/// common chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitChunks {
    pub name: String,
    /// Which chunks are considered for extraction ("initial": entry
    /// chunks only).
    pub chunks: String,
    /// A module goes into the common chunk when this many page entries
    /// reference it.
    pub min_chunks: u32,
    pub min_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MinimizerSpec {
    Css,
    #[serde(rename_all = "camelCase")]
    Script { extract_comments: bool },
}

/// Assemble the full bundle plan for a project.
///
/// Pure: reads nothing from disk, combines the already-loaded config with
/// the already-computed discovery result.
pub fn generate_plan(
    project_root: &Path,
    config: &BuildConfig,
    discovered: &DiscoveredPages,
) -> BundlePlan {
    let alias = config
        .alias
        .iter()
        .map(|(name, target)| (name.clone(), project_root.join(target)))
        .collect();

    BundlePlan {
        resolve: ResolveSettings { alias },
        entry: discovered.entries.clone(),
        output: OutputSettings {
            path: config.output_root(project_root),
            filename: SCRIPT_FILENAME.to_string(),
        },
        rules: asset_rules(),
        pages: discovered.pages.clone(),
        plugins: plugins(project_root, config),
        optimization: Optimization {
            split_chunks: SplitChunks {
                name: config.chunks.common_name.clone(),
                chunks: "initial".to_string(),
                min_chunks: config.chunks.min_shared,
                min_size: 0,
            },
            minimize: config.minify.enabled,
            minimizers: vec![
                MinimizerSpec::Css,
                MinimizerSpec::Script {
                    extract_comments: false,
                },
            ],
        },
    }
}

/// The fixed loader pipeline: stylesheets, scripts, fonts, images, and
/// HTML templates with image-reference rewriting.
fn asset_rules() -> Vec<AssetRule> {
    vec![
        AssetRule {
            test: r"\.css$".to_string(),
            exclude: None,
            loaders: vec![Loader::bare("extract-css"), Loader::bare("css")],
        },
        AssetRule {
            test: r"\.(sass|scss)$".to_string(),
            exclude: None,
            loaders: vec![
                Loader::bare("extract-css"),
                Loader::bare("css"),
                Loader::bare("sass"),
            ],
        },
        AssetRule {
            test: r"\.js$".to_string(),
            exclude: Some("node_modules".to_string()),
            loaders: vec![Loader::bare("babel")],
        },
        AssetRule {
            test: r"\.(woff|woff2|ttf|eot)(\?v=[0-9]\.[0-9]\.[0-9])?$".to_string(),
            exclude: None,
            loaders: vec![Loader::with_options(
                "file",
                &[("name", json!("fonts/[name].[ext]"))],
            )],
        },
        AssetRule {
            test: r"\.(png|jpe?g|gif|svg)(\?.*)?$".to_string(),
            exclude: None,
            loaders: vec![Loader::with_options(
                "url",
                &[
                    ("limit", json!(0)),
                    ("name", json!("img/[name].[ext]")),
                    ("esModule", json!(false)),
                ],
            )],
        },
        AssetRule {
            test: r"\.html$".to_string(),
            exclude: None,
            loaders: vec![Loader::bare("html-img")],
        },
    ]
}

fn plugins(project_root: &Path, config: &BuildConfig) -> Vec<PluginSpec> {
    vec![
        PluginSpec::ProvideGlobals {
            definitions: config.globals.clone(),
        },
        PluginSpec::ExtractCss {
            filename: CSS_FILENAME.to_string(),
        },
        PluginSpec::CopyStatic {
            from: config.static_root(project_root),
        },
        PluginSpec::CleanOutput,
    ]
}

/// Serialize a plan to pretty JSON at the given path.
///
/// Output is byte-stable for a given plan: all maps iterate in key order.
pub fn write_plan(plan: &BundlePlan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)
        .map_err(|e| Error::InvalidData(format!("Failed to serialize plan: {}", e)))?;
    fs::write(path, json)?;
    Ok(())
}
