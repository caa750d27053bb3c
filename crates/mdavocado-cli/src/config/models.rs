use mdavocado::core::compose::ImageMagick;
use mdavocado::engine::config::AnalysisConfig;
use std::path::PathBuf;

/// Where the `run` command obtains per-frame angles.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Dump { angles: PathBuf, roster: PathBuf },
    Command { program: PathBuf, args: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposeSettings {
    pub enabled: bool,
    pub animate: bool,
    pub tool: ImageMagick,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output: PathBuf,
    pub source: Option<SourceSpec>,
    pub analysis: AnalysisConfig,
    pub compose: ComposeSettings,
}
