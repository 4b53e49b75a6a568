//! Application configuration for cellstats.
//!
//! User config lives at `~/.cellstats/cellstats.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CellStatsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cellstats.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cellstats";

// ---------------------------------------------------------------------------
// Config structs (matching cellstats.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote endpoint URLs.
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Local input/output paths.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Curation settings.
    #[serde(default)]
    pub curation: CurationConfig,
}

/// `[endpoints]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    /// SPARQL query endpoint.
    #[serde(default = "default_sparql_endpoint")]
    pub sparql: String,

    /// Per-entity top-editors endpoint base (the entity id is appended).
    #[serde(default = "default_editor_stats_base")]
    pub editor_stats_base: String,

    /// Per-entity page-info endpoint base (the entity id is appended).
    #[serde(default = "default_article_info_base")]
    pub article_info_base: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            sparql: default_sparql_endpoint(),
            editor_stats_base: default_editor_stats_base(),
            article_info_base: default_article_info_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_sparql_endpoint() -> String {
    "https://query.wikidata.org/sparql".into()
}
fn default_editor_stats_base() -> String {
    "https://xtools.wmflabs.org/api/page/top_editors/wikidata.org".into()
}
fn default_article_info_base() -> String {
    "https://xtools.wmflabs.org/api/page/articleinfo/wikidata.org".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Local Turtle file holding the curated reading notes.
    #[serde(default = "default_graph_path")]
    pub local_graph: String,

    /// SVG badge template with `{{...}}` placeholders.
    #[serde(default = "default_svg_template")]
    pub svg_template: String,

    /// Directory all result artifacts are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            local_graph: default_graph_path(),
            svg_template: default_svg_template(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_graph_path() -> String {
    "./stats/data/read.ttl".into()
}
fn default_svg_template() -> String {
    "./stats/data/stats.svg".into()
}
fn default_output_dir() -> String {
    "./stats/results".into()
}

/// `[curation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Username whose editing/creation activity the report measures.
    #[serde(default = "default_curator")]
    pub curator_username: String,

    /// Species labels counted individually in the report.
    #[serde(default = "default_species")]
    pub species: Vec<String>,

    /// Predicate URI marking curated reading-notes subjects in the graph.
    #[serde(default = "default_notes_predicate")]
    pub notes_predicate: String,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            curator_username: default_curator(),
            species: default_species(),
            notes_predicate: default_notes_predicate(),
        }
    }
}

fn default_curator() -> String {
    "TiagoLubiana".into()
}
fn default_species() -> Vec<String> {
    vec!["Homo sapiens".into(), "Mus musculus".into()]
}
fn default_notes_predicate() -> String {
    "https://github.com/lubianat/wikidata_bib/tree/main/has_notes".into()
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration handed to each component at construction.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// SPARQL query endpoint.
    pub sparql_endpoint: String,
    /// Per-entity top-editors endpoint base.
    pub editor_stats_base: String,
    /// Per-entity page-info endpoint base.
    pub article_info_base: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Local Turtle graph path.
    pub local_graph_path: PathBuf,
    /// SVG badge template path.
    pub svg_template_path: PathBuf,
    /// Output directory for all artifacts.
    pub output_dir: PathBuf,
    /// Curator username measured by the report.
    pub curator_username: String,
    /// Species labels counted individually.
    pub species: Vec<String>,
    /// Predicate URI marking curated subjects.
    pub notes_predicate: String,
}

impl From<&AppConfig> for StatsConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            sparql_endpoint: config.endpoints.sparql.clone(),
            editor_stats_base: config.endpoints.editor_stats_base.clone(),
            article_info_base: config.endpoints.article_info_base.clone(),
            timeout_secs: config.endpoints.timeout_secs,
            local_graph_path: PathBuf::from(&config.paths.local_graph),
            svg_template_path: PathBuf::from(&config.paths.svg_template),
            output_dir: PathBuf::from(&config.paths.output_dir),
            curator_username: config.curation.curator_username.clone(),
            species: config.curation.species.clone(),
            notes_predicate: config.curation.notes_predicate.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cellstats/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CellStatsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cellstats/cellstats.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CellStatsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CellStatsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CellStatsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CellStatsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CellStatsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("sparql"));
        assert!(toml_str.contains("curator_username"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.endpoints.timeout_secs, 30);
        assert_eq!(parsed.curation.curator_username, "TiagoLubiana");
        assert_eq!(parsed.curation.species.len(), 2);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[paths]
output_dir = "/tmp/results"

[curation]
curator_username = "SomeoneElse"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.output_dir, "/tmp/results");
        assert_eq!(config.curation.curator_username, "SomeoneElse");
        // Untouched sections keep their defaults
        assert_eq!(config.endpoints.sparql, "https://query.wikidata.org/sparql");
        assert_eq!(config.curation.species[0], "Homo sapiens");
    }

    #[test]
    fn stats_config_from_app_config() {
        let app = AppConfig::default();
        let stats = StatsConfig::from(&app);
        assert_eq!(stats.timeout_secs, 30);
        assert_eq!(stats.output_dir, PathBuf::from("./stats/results"));
        assert!(stats.notes_predicate.ends_with("has_notes"));
    }
}
