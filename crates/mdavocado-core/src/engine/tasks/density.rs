use crate::core::models::angles::AngleFamily;
use crate::core::models::table::{AngleTable, ResiduePair};
use crate::core::render::density::DensityCanvas;
use crate::engine::artifacts::{ArtifactStore, ensure_parent};
use crate::engine::config::RenderingConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::segmentation::ResidueSegmentation;
use std::ops::Range;
use std::path::PathBuf;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One density image to draw: a residue's pair over a block of table rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub serial: usize,
    pub column: usize,
    pub rows: Range<usize>,
    pub path: PathBuf,
}

/// One image per residue per chunk. In cumulative mode chunk `i` covers every
/// frame from 0 to the end of chunk `i`.
pub fn chunk_jobs(
    pairs: &[ResiduePair],
    ranges: &[Range<usize>],
    cumulative: bool,
    store: &ArtifactStore,
) -> Vec<ImageJob> {
    ranges
        .iter()
        .enumerate()
        .flat_map(|(chunk, range)| {
            let rows = if cumulative { 0..range.end } else { range.clone() };
            pairs.iter().map(move |pair| ImageJob {
                serial: pair.serial,
                column: pair.column,
                rows: rows.clone(),
                path: store.chunk_image(chunk, ranges.len(), pair.serial),
            })
        })
        .collect()
}

/// One image per detected segment of every residue.
pub fn segment_jobs(segmentations: &[ResidueSegmentation], store: &ArtifactStore) -> Vec<ImageJob> {
    segmentations
        .iter()
        .flat_map(|seg| {
            let count = seg.breakpoints.indices().len();
            seg.breakpoints
                .segments()
                .enumerate()
                .map(move |(i, rows)| ImageJob {
                    serial: seg.serial,
                    column: seg.column,
                    rows,
                    path: store.segment_image(seg.serial, i, count),
                })
        })
        .collect()
}

/// Draws every job over the family's periodic domain. Returns the number of
/// images written.
#[instrument(skip_all, name = "density_task", fields(images = jobs.len()))]
pub fn run(
    table: &AngleTable,
    family: AngleFamily,
    rendering: &RenderingConfig,
    jobs: &[ImageJob],
    reporter: &ProgressReporter,
) -> Result<usize, EngineError> {
    let canvas = DensityCanvas::new(rendering.width, rendering.height, family.domain());
    reporter.report(Progress::TaskStart {
        total_steps: jobs.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = jobs.iter();

    #[cfg(feature = "parallel")]
    let iterator = jobs.par_iter();

    iterator
        .map(|job| -> Result<(), EngineError> {
            let samples = table.pair_samples(job.column, job.rows.clone())?;
            ensure_parent(&job.path)?;
            canvas
                .render_to_path(&samples, &job.path)
                .map_err(|e| EngineError::Render {
                    serial: job.serial,
                    source: e,
                })?;
            reporter.report(Progress::ArtifactWritten(job.path.clone()));
            reporter.report(Progress::TaskIncrement);
            Ok(())
        })
        .collect::<Result<Vec<()>, EngineError>>()?;

    reporter.report(Progress::TaskFinish);
    info!(
        images = jobs.len(),
        width = rendering.width,
        height = rendering.height,
        "Density images written."
    );
    Ok(jobs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::table::ColumnKey;
    use crate::core::stats::changepoint::Breakpoints;
    use tempfile::tempdir;

    fn pairs() -> Vec<ResiduePair> {
        vec![
            ResiduePair { serial: 1, column: 0 },
            ResiduePair { serial: 2, column: 2 },
        ]
    }

    #[test]
    fn chunk_jobs_cover_each_residue_in_each_chunk() {
        let store = ArtifactStore::new("out", 2);
        let ranges = vec![0..10, 10..20, 20..35];
        let jobs = chunk_jobs(&pairs(), &ranges, false, &store);
        assert_eq!(jobs.len(), 6);
        assert_eq!(jobs[2].rows, 10..20);
        assert_eq!(jobs[2].serial, 1);
        assert_eq!(jobs[5].path, PathBuf::from("out/chunks/chunk2/2.png"));

        let cumulative = chunk_jobs(&pairs(), &ranges, true, &store);
        let rows: Vec<_> = cumulative.iter().map(|j| j.rows.clone()).collect();
        assert_eq!(rows, vec![0..10, 0..10, 0..20, 0..20, 0..35, 0..35]);
    }

    #[test]
    fn segment_jobs_follow_breakpoints() {
        let store = ArtifactStore::new("out", 2);
        let segmentations = vec![
            ResidueSegmentation {
                serial: 2,
                label: "GLY A 2".to_string(),
                column: 2,
                breakpoints: Breakpoints::from_indices(vec![300, 800, 1000]),
            },
        ];
        let jobs = segment_jobs(&segmentations, &store);
        let rows: Vec<_> = jobs.iter().map(|j| j.rows.clone()).collect();
        assert_eq!(rows, vec![0..300, 300..800, 800..1000]);
        assert_eq!(jobs[1].path, PathBuf::from("out/segments/2/1.png"));
    }

    #[test]
    fn run_writes_one_png_per_job() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 2);
        let columns = ColumnKey::pairs_for([1, 2], AngleFamily::Backbone);
        let table = AngleTable::from_rows(
            columns,
            0,
            (0..40).map(|f| vec![-60.0 + f as f64, -40.0, 60.0, 179.0]),
        )
        .unwrap();
        let ranges = vec![0..20, 20..40];
        let jobs = chunk_jobs(&pairs(), &ranges, false, &store);
        let rendering = RenderingConfig {
            width: 32,
            height: 32,
        };

        let written = run(
            &table,
            AngleFamily::Backbone,
            &rendering,
            &jobs,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(written, 4);
        for job in &jobs {
            let image = image::open(&job.path).unwrap();
            assert_eq!((image.width(), image.height()), (32, 32));
        }
    }

    #[test]
    fn job_outside_the_table_is_an_error() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 1);
        let columns = ColumnKey::pairs_for([1], AngleFamily::Backbone);
        let table = AngleTable::from_rows(columns, 0, [vec![0.0, 0.0]]).unwrap();
        let jobs = vec![ImageJob {
            serial: 1,
            column: 0,
            rows: 0..5,
            path: store.chunk_image(0, 1, 1),
        }];
        let rendering = RenderingConfig {
            width: 8,
            height: 8,
        };
        let err = run(
            &table,
            AngleFamily::Backbone,
            &rendering,
            &jobs,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Table { .. }));
    }
}
