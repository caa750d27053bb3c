use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileFamily {
    #[default]
    Backbone,
    Sidechain,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSourceConfig {
    pub angles: Option<PathBuf>,
    pub roster: Option<PathBuf>,
    pub extractor: Option<PathBuf>,
    pub extractor_args: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileStructureConfig {
    pub family: Option<FileFamily>,
    /// Number of equally long chains.
    pub chains: Option<usize>,
    /// Explicit chain lengths in roster order; takes precedence over `chains`.
    pub chain_lengths: Option<Vec<usize>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileChunkingConfig {
    pub splits: Option<usize>,
    pub cumulative: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileCorrelationConfig {
    pub threshold: Option<f64>,
    pub block_rows: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSegmentationConfig {
    pub stride: Option<usize>,
    pub window_width: Option<usize>,
    pub penalty: Option<f64>,
    pub unwrap: Option<bool>,
    pub rewrap: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRenderingConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileComposeConfig {
    pub enabled: Option<bool>,
    pub animate: Option<bool>,
    pub montage: Option<PathBuf>,
    pub convert: Option<PathBuf>,
    pub tile_columns: Option<usize>,
    pub frame_delay: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<FileSourceConfig>,
    pub structure: Option<FileStructureConfig>,
    pub chunking: Option<FileChunkingConfig>,
    pub correlation: Option<FileCorrelationConfig>,
    pub segmentation: Option<FileSegmentationConfig>,
    pub rendering: Option<FileRenderingConfig>,
    pub compose: Option<FileComposeConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let Some(base) = path.parent() {
            config.resolve_relative_paths(base);
        }
        Ok(config)
    }

    /// Paths in a config file are relative to the file, not to the working directory.
    fn resolve_relative_paths(&mut self, base: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p.as_mut() {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        };
        if let Some(source) = self.source.as_mut() {
            resolve(&mut source.angles);
            resolve(&mut source.roster);
        }
    }
}
