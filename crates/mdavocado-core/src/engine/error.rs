use super::config::ConfigError;
use crate::core::compose::ComposeError;
use crate::core::io::csv_table::TableIoError;
use crate::core::models::residue::ResidueError;
use crate::core::models::table::TableError;
use crate::core::render::RenderError;
use crate::core::source::SourceError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Angle source failed for frames {start}..{end}: {source}")]
    Source {
        start: usize,
        end: usize,
        #[source]
        source: SourceError,
    },

    #[error("Angle source failed: {source}")]
    SourceSetup {
        #[from]
        source: SourceError,
    },

    #[error("Residue mapping failed: {source}")]
    Residue {
        #[from]
        source: ResidueError,
    },

    #[error("Inconsistent angle table: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Failed to access table '{path}': {source}", path = path.display())]
    TableFile {
        path: PathBuf,
        #[source]
        source: TableIoError,
    },

    #[error("Failed to access '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize '{path}': {source}", path = path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Rendering failed for residue {serial}: {source}")]
    Render {
        serial: usize,
        #[source]
        source: RenderError,
    },

    #[error("Compositing failed: {source}")]
    Compose {
        #[from]
        source: ComposeError,
    },
}
