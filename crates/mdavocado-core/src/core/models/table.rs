use super::angles::{AngleFamily, AngleKind};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Tables have different column layouts and cannot be concatenated")]
    ColumnMismatch,
    #[error("Cannot concatenate an empty list of tables")]
    NothingToConcatenate,
    #[error("Table has {0} columns; angle tables must hold whole residue pairs")]
    OddColumnCount(usize),
    #[error("Columns {column} and {} do not belong to the same residue", column + 1)]
    BrokenPair { column: usize },
    #[error("Column {column} holds {kind}, which is not part of the {family:?} family pair")]
    WrongKind {
        column: usize,
        kind: AngleKind,
        family: AngleFamily,
    },
    #[error("Residue serials must be strictly increasing across pairs (column {column})")]
    UnorderedPairs { column: usize },
    #[error("Row range {start}..{end} is outside the table ({rows} rows)")]
    RowRange { start: usize, end: usize, rows: usize },
    #[error("Invalid column header '{0}', expected '<serial>:<kind>'")]
    InvalidHeader(String),
}

/// Identifies one column of an [`AngleTable`]: the residue serial and the dihedral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub serial: usize,
    pub kind: AngleKind,
}

impl ColumnKey {
    pub fn new(serial: usize, kind: AngleKind) -> Self {
        Self { serial, kind }
    }

    /// The two columns tracked for each serial, in table order.
    pub fn pairs_for(serials: impl IntoIterator<Item = usize>, family: AngleFamily) -> Vec<Self> {
        let (first, second) = family.kinds();
        serials
            .into_iter()
            .flat_map(|s| [Self::new(s, first), Self::new(s, second)])
            .collect()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.serial, self.kind)
    }
}

impl FromStr for ColumnKey {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TableError::InvalidHeader(s.to_string());
        let (serial, kind) = s.trim().split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            serial: serial.trim().parse().map_err(|_| invalid())?,
            kind: kind.parse().map_err(|_| invalid())?,
        })
    }
}

/// The residue a pair of adjacent columns belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResiduePair {
    pub serial: usize,
    pub column: usize,
}

/// Per-frame dihedral angles in degrees, stored row-major.
///
/// Row `i` holds frame `first_frame + i`; every row has one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleTable {
    columns: Vec<ColumnKey>,
    first_frame: usize,
    values: Vec<f64>,
}

impl AngleTable {
    pub fn new(columns: Vec<ColumnKey>, first_frame: usize) -> Self {
        Self {
            columns,
            first_frame,
            values: Vec::new(),
        }
    }

    pub fn from_rows(
        columns: Vec<ColumnKey>,
        first_frame: usize,
        rows: impl IntoIterator<Item = Vec<f64>>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(columns, first_frame);
        for row in rows {
            table.push_row(&row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.n_rows(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.values.extend_from_slice(row);
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.values.len() / self.columns.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    pub fn first_frame(&self) -> usize {
        self.first_frame
    }

    pub fn frames(&self) -> Range<usize> {
        self.first_frame..self.first_frame + self.n_rows()
    }

    /// Renumbers the rows so that row 0 is `first_frame`. Values are untouched.
    pub fn rebased(mut self, first_frame: usize) -> Self {
        self.first_frame = first_frame;
        self
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let w = self.columns.len();
        &self.values[index * w..(index + 1) * w]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.columns.len().max(1))
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.columns.len() + column]
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows().map(move |r| r[column])
    }

    /// `(x, y)` samples of columns `column` and `column + 1` over `rows`.
    pub fn pair_samples(
        &self,
        column: usize,
        rows: Range<usize>,
    ) -> Result<Vec<(f64, f64)>, TableError> {
        self.check_rows(&rows)?;
        Ok(rows
            .map(|r| (self.value(r, column), self.value(r, column + 1)))
            .collect())
    }

    /// Columns `column` and `column + 1`, keeping every `stride`-th row.
    pub fn strided_pair(&self, column: usize, stride: usize) -> Vec<[f64; 2]> {
        self.rows()
            .step_by(stride.max(1))
            .map(|r| [r[column], r[column + 1]])
            .collect()
    }

    pub fn slice_rows(&self, rows: Range<usize>) -> Result<AngleTable, TableError> {
        self.check_rows(&rows)?;
        let w = self.columns.len();
        Ok(Self {
            columns: self.columns.clone(),
            first_frame: self.first_frame + rows.start,
            values: self.values[rows.start * w..rows.end * w].to_vec(),
        })
    }

    /// Appends `tables` in the order given and renumbers rows from frame 0.
    pub fn concat(tables: impl IntoIterator<Item = AngleTable>) -> Result<Self, TableError> {
        let mut tables = tables.into_iter();
        let mut merged = tables.next().ok_or(TableError::NothingToConcatenate)?;
        for table in tables {
            if table.columns != merged.columns {
                return Err(TableError::ColumnMismatch);
            }
            merged.values.extend(table.values);
        }
        merged.first_frame = 0;
        Ok(merged)
    }

    /// Checks that columns form adjacent same-residue pairs of `family`.
    pub fn residue_pairs(&self, family: AngleFamily) -> Result<Vec<ResiduePair>, TableError> {
        if self.columns.len() % 2 != 0 {
            return Err(TableError::OddColumnCount(self.columns.len()));
        }
        let (first_kind, second_kind) = family.kinds();
        let mut pairs: Vec<ResiduePair> = Vec::with_capacity(self.columns.len() / 2);

        for (pair_idx, chunk) in self.columns.chunks_exact(2).enumerate() {
            let column = pair_idx * 2;
            let (first, second) = (chunk[0], chunk[1]);
            if first.serial != second.serial {
                return Err(TableError::BrokenPair { column });
            }
            for (offset, key, expected) in [(0, first, first_kind), (1, second, second_kind)] {
                if key.kind != expected {
                    return Err(TableError::WrongKind {
                        column: column + offset,
                        kind: key.kind,
                        family,
                    });
                }
            }
            if pairs.last().is_some_and(|p| p.serial >= first.serial) {
                return Err(TableError::UnorderedPairs { column });
            }
            pairs.push(ResiduePair {
                serial: first.serial,
                column,
            });
        }
        Ok(pairs)
    }

    fn check_rows(&self, rows: &Range<usize>) -> Result<(), TableError> {
        if rows.start > rows.end || rows.end > self.n_rows() {
            return Err(TableError::RowRange {
                start: rows.start,
                end: rows.end,
                rows: self.n_rows(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backbone_columns(serials: &[usize]) -> Vec<ColumnKey> {
        ColumnKey::pairs_for(serials.iter().copied(), AngleFamily::Backbone)
    }

    fn ramp(columns: Vec<ColumnKey>, first_frame: usize, n: usize) -> AngleTable {
        let w = columns.len();
        let rows = (0..n).map(|r| {
            (0..w)
                .map(|c| ((first_frame + r) * 10 + c) as f64)
                .collect()
        });
        AngleTable::from_rows(columns, first_frame, rows).unwrap()
    }

    #[test]
    fn column_key_parses_headers() {
        let key: ColumnKey = "12:chi1".parse().unwrap();
        assert_eq!(key, ColumnKey::new(12, AngleKind::Chi1));
        assert_eq!(key.to_string(), "12:chi1");
        assert!("12-phi".parse::<ColumnKey>().is_err());
        assert!("x:phi".parse::<ColumnKey>().is_err());
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut table = AngleTable::new(backbone_columns(&[2]), 0);
        assert_eq!(
            table.push_row(&[1.0]),
            Err(TableError::RowWidth {
                row: 0,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn concat_preserves_row_order_and_resets_index() {
        let columns = backbone_columns(&[2, 3]);
        let a = ramp(columns.clone(), 0, 3);
        let b = ramp(columns.clone(), 3, 2).slice_rows(0..2).unwrap();
        let mut b_shifted = b.clone();
        b_shifted.first_frame = 40;

        let merged = AngleTable::concat([a, b_shifted]).unwrap();
        assert_eq!(merged.first_frame(), 0);
        assert_eq!(merged.n_rows(), 5);
        for i in 0..5 {
            assert_eq!(merged.value(i, 0), (i * 10) as f64);
        }
    }

    #[test]
    fn concat_rejects_different_layouts() {
        let a = ramp(backbone_columns(&[2]), 0, 1);
        let b = ramp(backbone_columns(&[3]), 1, 1);
        assert_eq!(AngleTable::concat([a, b]), Err(TableError::ColumnMismatch));
        assert_eq!(
            AngleTable::concat(Vec::new()),
            Err(TableError::NothingToConcatenate)
        );
    }

    #[test]
    fn residue_pairs_validates_layout() {
        let table = ramp(backbone_columns(&[2, 3, 7]), 0, 1);
        let pairs = table.residue_pairs(AngleFamily::Backbone).unwrap();
        assert_eq!(
            pairs.iter().map(|p| (p.serial, p.column)).collect::<Vec<_>>(),
            vec![(2, 0), (3, 2), (7, 4)]
        );

        assert!(matches!(
            table.residue_pairs(AngleFamily::Sidechain),
            Err(TableError::WrongKind { column: 0, .. })
        ));

        let broken = AngleTable::new(
            vec![
                ColumnKey::new(2, AngleKind::Phi),
                ColumnKey::new(3, AngleKind::Psi),
            ],
            0,
        );
        assert_eq!(
            broken.residue_pairs(AngleFamily::Backbone),
            Err(TableError::BrokenPair { column: 0 })
        );

        let unordered = AngleTable::new(backbone_columns(&[3, 2]), 0);
        assert_eq!(
            unordered.residue_pairs(AngleFamily::Backbone),
            Err(TableError::UnorderedPairs { column: 2 })
        );
    }

    #[test]
    fn pair_samples_and_strided_pair_select_expected_rows() {
        let table = ramp(backbone_columns(&[2, 3]), 0, 10);
        let samples = table.pair_samples(2, 4..6).unwrap();
        assert_eq!(samples, vec![(42.0, 43.0), (52.0, 53.0)]);
        assert!(table.pair_samples(0, 8..11).is_err());

        let strided = table.strided_pair(0, 4);
        assert_eq!(strided, vec![[0.0, 1.0], [40.0, 41.0], [80.0, 81.0]]);
    }
}
