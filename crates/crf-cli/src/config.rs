//! Run configuration loaded from `crf.toml`.
//!
//! The file is looked up from `--config`, then the `CRF_CONFIG` environment
//! variable, then `./crf.toml`. Relative paths inside it are resolved
//! against the directory holding the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crf_core::Envelope;
use crf_ingest::SourcePaths;
use crf_model::{HiddenRowPolicy, OdmVersion};
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "CRF_CONFIG";

/// Configuration file used when nothing else is given.
pub const DEFAULT_CONFIG_FILE: &str = "crf.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub schema: Option<SchemaConfig>,
    #[serde(default)]
    pub stylesheet: Option<StylesheetConfig>,
    #[serde(default)]
    pub document: Envelope,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Root directory for generated files; each form gets a subdirectory.
    pub crf_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataConfig {
    pub forms_workbook: PathBuf,
    #[serde(default = "default_forms_sheet")]
    pub forms_sheet: String,
    pub collection_workbook: PathBuf,
    #[serde(default = "default_collection_sheet")]
    pub collection_sheet: String,
}

/// XML Schemas per ODM release and the validator command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    pub odm132: Option<PathBuf>,
    pub odm20: Option<PathBuf>,
    #[serde(default = "default_validator")]
    pub validator: String,
}

/// XSLT stylesheets per ODM release and the processor command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesheetConfig {
    pub odm132: Option<PathBuf>,
    pub odm20: Option<PathBuf>,
    #[serde(default = "default_processor")]
    pub processor: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Overrides the per-release default.
    pub hidden_rows: Option<HiddenRowPolicy>,
}

fn default_forms_sheet() -> String {
    "Forms".to_string()
}

fn default_collection_sheet() -> String {
    "Collection Specializations".to_string()
}

fn default_validator() -> String {
    "xmllint".to_string()
}

fn default_processor() -> String {
    "xsltproc".to_string()
}

fn per_version<'a>(
    version: OdmVersion,
    odm132: Option<&'a Path>,
    odm20: Option<&'a Path>,
) -> Option<&'a Path> {
    match version {
        OdmVersion::V1_3_2 => odm132,
        OdmVersion::V2_0 => odm20,
    }
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl SchemaConfig {
    pub fn schema_for(&self, version: OdmVersion) -> Option<&Path> {
        per_version(version, self.odm132.as_deref(), self.odm20.as_deref())
    }
}

impl StylesheetConfig {
    pub fn stylesheet_for(&self, version: OdmVersion) -> Option<&Path> {
        per_version(version, self.odm132.as_deref(), self.odm20.as_deref())
    }
}

impl PolicyConfig {
    pub fn hidden_rows_for(&self, version: OdmVersion) -> HiddenRowPolicy {
        self.hidden_rows
            .unwrap_or_else(|| HiddenRowPolicy::default_for(version))
    }
}

impl Config {
    /// Parse configuration text. Relative paths are resolved against
    /// `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Config = toml::from_str(text).context("parse configuration")?;
        config.resolve_paths(base_dir);
        Ok(config)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read configuration file {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base_dir).with_context(|| format!("in {}", path.display()))
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        resolve(base_dir, &mut self.paths.crf_path);
        resolve(base_dir, &mut self.metadata.forms_workbook);
        resolve(base_dir, &mut self.metadata.collection_workbook);
        if let Some(schema) = &mut self.schema {
            for path in [&mut schema.odm132, &mut schema.odm20].into_iter().flatten() {
                resolve(base_dir, path);
            }
        }
        if let Some(stylesheet) = &mut self.stylesheet {
            for path in [&mut stylesheet.odm132, &mut stylesheet.odm20]
                .into_iter()
                .flatten()
            {
                resolve(base_dir, path);
            }
        }
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths {
            forms_path: self.metadata.forms_workbook.clone(),
            forms_sheet: self.metadata.forms_sheet.clone(),
            collection_path: self.metadata.collection_workbook.clone(),
            collection_sheet: self.metadata.collection_sheet.clone(),
        }
    }
}

/// Pick the configuration file: the explicit path, else the environment
/// value, else `crf.toml` in the working directory.
pub fn resolve_config_path(explicit: Option<&Path>, from_env: Option<PathBuf>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or(from_env)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
