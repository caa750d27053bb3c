//! Providers of per-frame dihedral angles.
//!
//! Computing dihedrals from a structure and trajectory is delegated to an
//! external provider. Everything downstream only sees the [`AngleSource`]
//! contract: a frame count, the residue roster, the column layout, and the angle
//! table for any half-open frame range.

mod command;
mod dump;

pub use self::command::CommandAngleSource;
pub use self::dump::CsvAngleSource;

use crate::core::io::csv_table::TableIoError;
use crate::core::models::table::{AngleTable, ColumnKey};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed angle data: {0}")]
    Table(#[from] TableIoError),
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    Command {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Unexpected output from angle provider: {0}")]
    InvalidOutput(String),
    #[error("Requested frames {start}..{end}, but the source has {frames} frames")]
    OutOfRange {
        start: usize,
        end: usize,
        frames: usize,
    },
}

/// A provider of dihedral angles for a fixed residue selection.
///
/// Implementations must be `Sync`: chunks may be requested concurrently.
pub trait AngleSource: Sync {
    /// Total number of frames in the trajectory.
    fn frame_count(&self) -> usize;

    /// Residue names in serial order; serial `n` is `roster()[n - 1]`.
    fn roster(&self) -> &[String];

    /// The column every returned table carries, in order.
    fn layout(&self) -> &[ColumnKey];

    /// Angles for frames `start..end`. Row `i` of the result is frame `start + i`.
    fn angles(&self, start: usize, end: usize) -> Result<AngleTable, SourceError>;
}

pub(crate) fn check_range(start: usize, end: usize, frames: usize) -> Result<(), SourceError> {
    if start > end || end > frames {
        return Err(SourceError::OutOfRange { start, end, frames });
    }
    Ok(())
}

pub(crate) fn parse_roster(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}
