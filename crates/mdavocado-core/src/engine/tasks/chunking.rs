use crate::core::io::csv_table::{CompactCsvTable, CsvTable};
use crate::core::io::traits::TableFile;
use crate::core::models::table::AngleTable;
use crate::core::source::AngleSource;
use crate::engine::artifacts::{ArtifactStore, ensure_parent};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::ops::Range;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One persisted slice of the trajectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub start: usize,
    pub end: usize,
    pub path: PathBuf,
}

impl ChunkDescriptor {
    pub fn frames(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Cuts `0..total_frames` into `splits` contiguous ranges of `total_frames / splits`
/// frames; the last range absorbs the remainder.
pub fn partition(total_frames: usize, splits: usize) -> Result<Vec<Range<usize>>, EngineError> {
    if splits == 0 {
        return Err(EngineError::InvalidInput(
            "the trajectory must be cut into at least one chunk".to_string(),
        ));
    }
    let step = total_frames / splits;
    if step == 0 {
        return Err(EngineError::InvalidInput(format!(
            "{total_frames} frames cannot be cut into {splits} non-empty chunks"
        )));
    }
    Ok((0..splits)
        .map(|i| {
            let end = if i + 1 == splits { total_frames } else { (i + 1) * step };
            i * step..end
        })
        .collect())
}

/// Requests every range from `source` and persists each chunk on its own.
///
/// Any failing chunk aborts the extraction; the returned descriptors are in
/// range order regardless of the order chunks complete in.
#[instrument(skip_all, name = "chunk_extraction_task", fields(chunks = ranges.len()))]
pub fn extract(
    source: &dyn AngleSource,
    ranges: &[Range<usize>],
    store: &ArtifactStore,
    reporter: &ProgressReporter,
) -> Result<Vec<ChunkDescriptor>, EngineError> {
    if let Some(empty) = ranges.iter().find(|r| r.is_empty()) {
        return Err(EngineError::InvalidInput(format!(
            "chunk {}..{} contains no frames",
            empty.start, empty.end
        )));
    }
    info!(frames = source.frame_count(), "Extracting angle chunks.");
    reporter.report(Progress::TaskStart {
        total_steps: ranges.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = ranges.iter();

    #[cfg(feature = "parallel")]
    let iterator = ranges.par_iter();

    let chunks = iterator
        .map(|range| -> Result<ChunkDescriptor, EngineError> {
            let chunk = extract_chunk(source, range.clone(), store)?;
            reporter.report(Progress::ArtifactWritten(chunk.path.clone()));
            reporter.report(Progress::TaskIncrement);
            Ok(chunk)
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    reporter.report(Progress::TaskFinish);
    Ok(chunks)
}

fn extract_chunk(
    source: &dyn AngleSource,
    range: Range<usize>,
    store: &ArtifactStore,
) -> Result<ChunkDescriptor, EngineError> {
    let (start, end) = (range.start, range.end);
    let table = source
        .angles(start, end)
        .map_err(|e| EngineError::Source { start, end, source: e })?;

    if table.frames() != range {
        return Err(EngineError::InvalidInput(format!(
            "angle source returned frames {:?} for request {start}..{end}",
            table.frames()
        )));
    }
    if table.columns() != source.layout() {
        return Err(EngineError::InvalidInput(format!(
            "angle source returned a different column layout for frames {start}..{end}"
        )));
    }

    let path = store.chunk_table(start, end);
    ensure_parent(&path)?;
    CsvTable::write_to_path(&table, &path).map_err(|e| EngineError::TableFile {
        path: path.clone(),
        source: e,
    })?;
    debug!(start, end, path = %path.display(), "Persisted chunk.");
    Ok(ChunkDescriptor { start, end, path })
}

/// Reloads `chunks` in frame order, concatenates them into the canonical table
/// and persists it at single precision. The returned table is the persisted one,
/// so downstream stages see the same values whether or not they run in the same
/// process.
#[instrument(skip_all, name = "chunk_assembly_task", fields(chunks = chunks.len()))]
pub fn assemble(
    chunks: &[ChunkDescriptor],
    store: &ArtifactStore,
    reporter: &ProgressReporter,
) -> Result<AngleTable, EngineError> {
    let mut ordered: Vec<&ChunkDescriptor> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.start);

    let mut expected_start = 0;
    for chunk in &ordered {
        if chunk.start != expected_start {
            return Err(EngineError::InvalidInput(format!(
                "chunks leave a gap or overlap at frame {expected_start} (next chunk starts at {})",
                chunk.start
            )));
        }
        if chunk.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "chunk {}..{} contains no frames",
                chunk.start, chunk.end
            )));
        }
        expected_start = chunk.end;
    }

    let tables = ordered
        .iter()
        .map(|chunk| -> Result<AngleTable, EngineError> {
            let table =
                CsvTable::read_from_path(&chunk.path).map_err(|e| EngineError::TableFile {
                    path: chunk.path.clone(),
                    source: e,
                })?;
            if table.frames() != chunk.frames() {
                return Err(EngineError::InvalidInput(format!(
                    "chunk file '{}' holds frames {:?}, expected {:?}",
                    chunk.path.display(),
                    table.frames(),
                    chunk.frames()
                )));
            }
            Ok(table)
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    let merged = AngleTable::concat(tables)?;
    let path = store.canonical_table();
    ensure_parent(&path)?;
    CompactCsvTable::write_to_path(&merged, &path).map_err(|e| EngineError::TableFile {
        path: path.clone(),
        source: e,
    })?;
    info!(
        frames = merged.n_rows(),
        columns = merged.n_cols(),
        path = %path.display(),
        "Canonical angle table written."
    );
    reporter.report(Progress::ArtifactWritten(path.clone()));

    load_canonical(store)
}

pub fn load_canonical(store: &ArtifactStore) -> Result<AngleTable, EngineError> {
    let path = store.canonical_table();
    CompactCsvTable::read_from_path(&path).map_err(|e| EngineError::TableFile { path, source: e })
}
