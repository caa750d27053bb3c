use crate::core::models::residue::ResidueIndex;
use crate::core::models::table::AngleTable;
use crate::core::source::AngleSource;
use crate::engine::artifacts::{ArtifactStore, read_roster, write_json, write_roster};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::chunking::{self, ChunkDescriptor};
use crate::engine::tasks::correlation::{self, CorrelationMap};
use crate::engine::tasks::density;
use crate::engine::tasks::segmentation::{self, ResidueSegmentation};
use std::path::Path;
use tracing::{info, instrument};

/// The canonical table together with everything needed to interpret it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: AngleTable,
    pub index: ResidueIndex,
    pub store: ArtifactStore,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub chunks: Vec<ChunkDescriptor>,
    pub correlations: CorrelationMap,
    pub segmentations: Vec<ResidueSegmentation>,
    pub chunk_images: usize,
    pub segment_images: usize,
}

/// Runs every stage against `source`, writing all artifacts under `output`.
#[instrument(skip_all, name = "pipeline_workflow", fields(output = %output.display()))]
pub fn run(
    source: &dyn AngleSource,
    config: &AnalysisConfig,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<PipelineResult, EngineError> {
    let (chunks, analysis) = extract(source, config, output, reporter)?;
    let correlations = correlate(&analysis, config, reporter)?;
    let (segmentations, segment_images) = segment(&analysis, config, reporter)?;
    let chunk_images = render(&analysis, config, reporter)?;

    info!(
        chunks = chunks.len(),
        correlated = correlations.len(),
        chunk_images,
        segment_images,
        "Pipeline complete."
    );
    Ok(PipelineResult {
        chunks,
        correlations,
        segmentations,
        chunk_images,
        segment_images,
    })
}

/// Extracts the trajectory chunk by chunk and assembles the canonical table.
#[instrument(skip_all, name = "extraction_workflow")]
pub fn extract(
    source: &dyn AngleSource,
    config: &AnalysisConfig,
    output: &Path,
    reporter: &ProgressReporter,
) -> Result<(Vec<ChunkDescriptor>, Analysis), EngineError> {
    config.validate()?;
    let roster = source.roster().to_vec();
    let index = ResidueIndex::new(&roster, &config.chain_layout)?;
    check_layout(&AngleTable::new(source.layout().to_vec(), 0), &index, config)?;

    let store = ArtifactStore::new(output, roster.len());
    write_roster(&roster, &store.roster())?;

    let ranges = chunking::partition(source.frame_count(), config.chunking.splits)?;
    info!(
        frames = source.frame_count(),
        residues = roster.len(),
        chunks = ranges.len(),
        "Starting extraction."
    );

    let chunks = reporter.phase("Extracting chunks", || {
        chunking::extract(source, &ranges, &store, reporter)
    })?;
    let table = reporter.phase("Assembling table", || {
        chunking::assemble(&chunks, &store, reporter)
    })?;

    Ok((chunks, Analysis { table, index, store }))
}

/// Reloads the canonical table and roster written by a previous extraction.
pub fn load(output: &Path, config: &AnalysisConfig) -> Result<Analysis, EngineError> {
    config.validate()?;
    let probe = ArtifactStore::new(output, 1);
    let roster = read_roster(&probe.roster())?;
    let index = ResidueIndex::new(&roster, &config.chain_layout)?;
    let store = ArtifactStore::new(output, roster.len());
    let table = chunking::load_canonical(&store)?;
    check_layout(&table, &index, config)?;
    info!(
        frames = table.n_rows(),
        columns = table.n_cols(),
        "Loaded canonical angle table."
    );
    Ok(Analysis { table, index, store })
}

/// Computes the truncated circular correlation and writes `correlations.json`.
#[instrument(skip_all, name = "correlation_workflow")]
pub fn correlate(
    analysis: &Analysis,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<CorrelationMap, EngineError> {
    reporter.phase("Correlating angles", || -> Result<_, EngineError> {
        let map = correlation::run(
            &analysis.table,
            &analysis.index,
            config.family,
            &config.correlation,
            reporter,
        )?;
        let path = analysis.store.correlations();
        write_json(&map, &path)?;
        reporter.report(Progress::ArtifactWritten(path));
        Ok(map)
    })
}

/// Detects change points per residue, writes the breakpoint report and plots,
/// and draws one density image per detected segment.
#[instrument(skip_all, name = "segmentation_workflow")]
pub fn segment(
    analysis: &Analysis,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<(Vec<ResidueSegmentation>, usize), EngineError> {
    let segmentations = reporter.phase("Detecting change points", || {
        segmentation::run(
            &analysis.table,
            &analysis.index,
            config.family,
            &config.segmentation,
            &analysis.store,
            reporter,
        )
    })?;
    let images = reporter.phase("Rendering segments", || {
        let jobs = density::segment_jobs(&segmentations, &analysis.store);
        density::run(
            &analysis.table,
            config.family,
            &config.rendering,
            &jobs,
            reporter,
        )
    })?;
    Ok((segmentations, images))
}

/// Draws one density image per residue per chunk.
#[instrument(skip_all, name = "rendering_workflow")]
pub fn render(
    analysis: &Analysis,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<usize, EngineError> {
    reporter.phase("Rendering chunks", || -> Result<_, EngineError> {
        let pairs = analysis.table.residue_pairs(config.family)?;
        let ranges = chunking::partition(analysis.table.n_rows(), config.chunking.splits)?;
        let jobs = density::chunk_jobs(
            &pairs,
            &ranges,
            config.chunking.cumulative,
            &analysis.store,
        );
        density::run(
            &analysis.table,
            config.family,
            &config.rendering,
            &jobs,
            reporter,
        )
    })
}

/// Every column pair must belong to the configured family and to a residue of
/// the roster.
fn check_layout(
    table: &AngleTable,
    index: &ResidueIndex,
    config: &AnalysisConfig,
) -> Result<(), EngineError> {
    let pairs = table.residue_pairs(config.family)?;
    if pairs.is_empty() {
        return Err(EngineError::InvalidInput(
            "the angle source tracks no residues".to_string(),
        ));
    }
    for pair in &pairs {
        index.label(pair.serial)?;
    }
    Ok(())
}
