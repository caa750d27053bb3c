use crate::core::models::angles::AngleFamily;
use crate::core::models::residue::ResidueIndex;
use crate::core::models::table::{AngleTable, ResiduePair};
use crate::core::render::series::BreakpointPlot;
use crate::core::stats::changepoint::{Breakpoints, WindowDetector};
use crate::core::stats::circular::{rewrap_degrees, unwrap_degrees};
use crate::engine::artifacts::{ArtifactStore, ensure_parent, write_json};
use crate::engine::config::SegmentationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Change points of one residue's angle pair, as frame indices of the
/// canonical table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidueSegmentation {
    pub serial: usize,
    pub label: String,
    /// First column of the residue's pair in the table.
    pub column: usize,
    pub breakpoints: Breakpoints,
}

/// The detector input for the pair starting at `column`: unwrapped (and
/// optionally rewrapped) at full resolution, then thinned to every `stride`-th
/// frame.
pub fn prepare_series(
    table: &AngleTable,
    column: usize,
    config: &SegmentationConfig,
) -> Vec<[f64; 2]> {
    let transform = |values: Vec<f64>| -> Vec<f64> {
        if !config.unwrap {
            return values;
        }
        let unwrapped = unwrap_degrees(&values);
        if config.rewrap {
            unwrapped.into_iter().map(rewrap_degrees).collect()
        } else {
            unwrapped
        }
    };
    let first = transform(table.column(column).collect());
    let second = transform(table.column(column + 1).collect());
    first
        .into_iter()
        .zip(second)
        .step_by(config.stride.max(1))
        .map(|(a, b)| [a, b])
        .collect()
}

/// Detects change points for one residue and maps them to frames.
pub fn segment_pair(
    table: &AngleTable,
    pair: ResiduePair,
    config: &SegmentationConfig,
) -> Breakpoints {
    let series = prepare_series(table, pair.column, config);
    let detector = WindowDetector::new(config.window_width, config.penalty);
    let detected = detector.detect(&series);
    if detected.changes().is_empty() {
        debug!(serial = pair.serial, "No change points detected.");
    }
    detected.to_frames(config.stride.max(1), table.n_rows())
}

/// Segments every residue of `table`, writes `breakpoints.json` and one trace
/// plot per residue. Results are in residue order.
#[instrument(skip_all, name = "segmentation_task", fields(frames = table.n_rows()))]
pub fn run(
    table: &AngleTable,
    index: &ResidueIndex,
    family: AngleFamily,
    config: &SegmentationConfig,
    store: &ArtifactStore,
    reporter: &ProgressReporter,
) -> Result<Vec<ResidueSegmentation>, EngineError> {
    let pairs = table.residue_pairs(family)?;
    if table.is_empty() {
        return Err(EngineError::InvalidInput(
            "cannot segment an angle table without frames".to_string(),
        ));
    }
    let labels = pairs
        .iter()
        .map(|p| index.label(p.serial).map(|l| l.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        residues = pairs.len(),
        stride = config.stride,
        width = config.window_width,
        penalty = config.penalty,
        "Detecting change points."
    );
    reporter.report(Progress::TaskStart {
        total_steps: pairs.len() as u64,
    });

    let jobs: Vec<(ResiduePair, &String)> = pairs.into_iter().zip(&labels).collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = jobs.iter();

    #[cfg(feature = "parallel")]
    let iterator = jobs.par_iter();

    let results = iterator
        .map(|&(pair, label)| -> Result<ResidueSegmentation, EngineError> {
            let breakpoints = segment_pair(table, pair, config);
            plot_residue(table, pair, label, family, config, &breakpoints, store)?;
            reporter.report(Progress::TaskIncrement);
            Ok(ResidueSegmentation {
                serial: pair.serial,
                label: label.clone(),
                column: pair.column,
                breakpoints,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    reporter.report(Progress::TaskFinish);

    let report: BTreeMap<&str, &[usize]> = results
        .iter()
        .map(|r| (r.label.as_str(), r.breakpoints.indices()))
        .collect();
    let path = store.breakpoints();
    write_json(&report, &path)?;
    reporter.report(Progress::ArtifactWritten(path));

    let changed = results
        .iter()
        .filter(|r| !r.breakpoints.changes().is_empty())
        .count();
    info!(changed, residues = results.len(), "Segmentation complete.");
    Ok(results)
}

fn plot_residue(
    table: &AngleTable,
    pair: ResiduePair,
    label: &str,
    family: AngleFamily,
    config: &SegmentationConfig,
    breakpoints: &Breakpoints,
    store: &ArtifactStore,
) -> Result<(), EngineError> {
    let stride = config.stride.max(1);
    let frames: Vec<usize> = (0..table.n_rows()).step_by(stride).collect();
    let samples = table.strided_pair(pair.column, stride);
    let plot = BreakpointPlot {
        title: label.to_string(),
        family,
        frames: &frames,
        samples: &samples,
        breakpoints: breakpoints.changes(),
    };
    let path = store.breakpoint_plot(pair.serial);
    ensure_parent(&path)?;
    plot.draw(&path).map_err(|e| EngineError::Render {
        serial: pair.serial,
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::ChainLayout;
    use crate::core::models::table::ColumnKey;
    use tempfile::tempdir;

    fn config(stride: usize) -> SegmentationConfig {
        SegmentationConfig {
            stride,
            window_width: 100,
            penalty: 1e4,
            unwrap: true,
            rewrap: false,
        }
    }

    /// Residue 1 switches from an alpha to a beta conformation at `switch`;
    /// residue 2 stays put.
    fn switching_table(frames: usize, switch: usize) -> AngleTable {
        let columns = ColumnKey::pairs_for([1, 2], AngleFamily::Backbone);
        AngleTable::from_rows(
            columns,
            0,
            (0..frames).map(|f| {
                let wobble = ((f * 37) % 11) as f64 - 5.0;
                let (phi, psi) = if f < switch {
                    (-60.0 + wobble, -45.0 - wobble)
                } else {
                    (-120.0 + wobble, 130.0 + wobble)
                };
                vec![phi, psi, -75.0, 150.0]
            }),
        )
        .unwrap()
    }

    #[test]
    fn series_is_unwrapped_before_striding() {
        let columns = ColumnKey::pairs_for([1], AngleFamily::Backbone);
        let rows = [170.0, 179.0, -179.0, -170.0, -160.0]
            .into_iter()
            .map(|v| vec![v, 0.0]);
        let table = AngleTable::from_rows(columns, 0, rows).unwrap();

        let series = prepare_series(&table, 0, &config(2));
        assert_eq!(series, vec![[170.0, 0.0], [181.0, 0.0], [200.0, 0.0]]);

        let raw = prepare_series(
            &table,
            0,
            &SegmentationConfig {
                unwrap: false,
                ..config(2)
            },
        );
        assert_eq!(raw, vec![[170.0, 0.0], [-179.0, 0.0], [-160.0, 0.0]]);
    }

    #[test]
    fn rewrap_bounds_long_drifts() {
        let columns = ColumnKey::pairs_for([1], AngleFamily::Backbone);
        let rows = (0..8).map(|i| vec![((i * 100 + 180) % 360) as f64 - 180.0, 0.0]);
        let table = AngleTable::from_rows(columns, 0, rows).unwrap();
        let rewrapped = prepare_series(
            &table,
            0,
            &SegmentationConfig {
                rewrap: true,
                ..config(1)
            },
        );
        assert!(rewrapped.iter().all(|s| s[0].abs() < 360.0));
        let unwrapped = prepare_series(&table, 0, &config(1));
        assert_eq!(unwrapped.last().unwrap()[0], 700.0);
    }

    #[test]
    fn unwrapped_series_has_no_large_jumps() {
        let columns = ColumnKey::pairs_for([1], AngleFamily::Backbone);
        let raw: Vec<f64> = (0..400)
            .map(|i| {
                let continuous = -170.0 + i as f64 * 3.0;
                (continuous + 180.0).rem_euclid(360.0) - 180.0
            })
            .collect();
        let table =
            AngleTable::from_rows(columns, 0, raw.iter().map(|&v| vec![v, 0.0])).unwrap();
        let series = prepare_series(&table, 0, &config(1));
        for pair in series.windows(2) {
            assert!((pair[1][0] - pair[0][0]).abs() <= 3.0 + 1e-9);
        }
    }

    #[test]
    fn switch_is_located_in_frames() {
        let table = switching_table(20_000, 9_000);
        let bp = segment_pair(&table, ResiduePair { serial: 1, column: 0 }, &config(100));
        assert_eq!(bp.changes().len(), 1);
        assert!(bp.changes()[0].abs_diff(9_000) <= 500);
        assert_eq!(bp.series_len(), 20_000);

        let still = segment_pair(&table, ResiduePair { serial: 2, column: 2 }, &config(100));
        assert!(still.changes().is_empty());
        assert_eq!(still.indices(), &[20_000]);
    }

    #[test]
    fn run_writes_report_and_plots() {
        let dir = tempdir().unwrap();
        let table = switching_table(20_000, 9_000);
        let names = vec!["ALA".to_string(), "PRO".to_string()];
        let index = ResidueIndex::new(&names, &ChainLayout::Uniform { chains: 1 }).unwrap();
        let store = ArtifactStore::new(dir.path(), 2);

        let results = run(
            &table,
            &index,
            AngleFamily::Backbone,
            &config(100),
            &store,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "ALA A 1");
        assert_eq!(results[1].breakpoints.indices(), &[20_000]);

        let report: BTreeMap<String, Vec<usize>> =
            serde_json::from_str(&std::fs::read_to_string(store.breakpoints()).unwrap()).unwrap();
        assert_eq!(report["PRO A 2"], vec![20_000]);
        assert_eq!(report["ALA A 1"].last(), Some(&20_000));
        assert!(store.breakpoint_plot(1).exists());
        assert!(store.breakpoint_plot(2).exists());
    }
}
