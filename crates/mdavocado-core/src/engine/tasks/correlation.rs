use crate::core::models::angles::AngleFamily;
use crate::core::models::residue::ResidueIndex;
use crate::core::models::table::AngleTable;
use crate::core::stats::circular::{circular_correlation_matrix, degenerate_columns};
use crate::engine::config::CorrelationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Angle identity label → partner label → coefficient.
pub type CorrelationMap = BTreeMap<String, BTreeMap<String, f64>>;

/// The columns that keep at least one significant partner, and their submatrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncatedCorrelation {
    /// Indices into the original column order.
    pub columns: Vec<usize>,
    pub matrix: DMatrix<f64>,
}

impl TruncatedCorrelation {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Non-zero entries of every surviving row, labelled with `label(column)`.
    pub fn partners(&self, label: impl Fn(usize) -> String) -> CorrelationMap {
        let labels: Vec<String> = self.columns.iter().map(|&c| label(c)).collect();
        labels
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let row = labels
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| self.matrix[(i, j)] != 0.0)
                    .map(|(j, partner)| (partner.clone(), self.matrix[(i, j)]))
                    .collect();
                (name.clone(), row)
            })
            .collect()
    }
}

/// Keeps entries with `|r| > threshold` outside the diagonal and the two bands
/// next to it, then drops every row and column left without an entry.
pub fn truncate(matrix: &DMatrix<f64>, threshold: f64) -> TruncatedCorrelation {
    let masked = DMatrix::from_fn(matrix.nrows(), matrix.ncols(), |i, j| {
        let value = matrix[(i, j)];
        if i.abs_diff(j) <= 1 || value.abs() <= threshold {
            0.0
        } else {
            value
        }
    });

    let columns: Vec<usize> = (0..masked.nrows())
        .filter(|&i| masked.row(i).iter().any(|&v| v != 0.0))
        .collect();
    let matrix = masked.select_rows(&columns).select_columns(&columns);
    TruncatedCorrelation { columns, matrix }
}

/// Computes and truncates the circular correlation of every angle column of
/// `table`, which must hold residue pairs of `family`.
#[instrument(skip_all, name = "correlation_task", fields(columns = table.n_cols()))]
pub fn run(
    table: &AngleTable,
    index: &ResidueIndex,
    family: AngleFamily,
    config: &CorrelationConfig,
    reporter: &ProgressReporter,
) -> Result<CorrelationMap, EngineError> {
    table.residue_pairs(family)?;
    if table.is_empty() {
        return Err(EngineError::InvalidInput(
            "cannot correlate an angle table without frames".to_string(),
        ));
    }
    let identities = table
        .columns()
        .iter()
        .map(|key| {
            index
                .identity(key.serial, key.kind)
                .map(|id| id.to_string())
        })
        .collect::<Result<Vec<_>, _>>()?;

    reporter.report(Progress::Message(format!(
        "Correlating {} angle columns over {} frames...",
        table.n_cols(),
        table.n_rows()
    )));
    let matrix = circular_correlation_matrix(table, config.block_rows);

    let constant = degenerate_columns(&matrix);
    if !constant.is_empty() {
        warn!(
            count = constant.len(),
            columns = ?constant.iter().map(|&c| identities[c].as_str()).collect::<Vec<_>>(),
            "Angle columns without variance are excluded from correlation."
        );
    }

    let truncated = truncate(&matrix, config.threshold);
    info!(
        threshold = config.threshold,
        surviving = truncated.columns.len(),
        "Correlation matrix truncated."
    );
    Ok(truncated.partners(|c| identities[c].clone()))
}
