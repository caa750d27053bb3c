use super::{AngleSource, SourceError, check_range, parse_roster};
use crate::core::io::csv_table::{CsvTable, count_rows};
use crate::core::io::traits::TableFile;
use crate::core::models::table::{AngleTable, ColumnKey};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Angles from a pre-extracted dihedral dump.
///
/// The dump uses the table CSV layout (`frame` column followed by
/// `serial:kind` columns). The roster is a text file with one residue name per
/// line. Range queries stream the dump and keep only the requested rows.
#[derive(Debug, Clone)]
pub struct CsvAngleSource {
    angles_path: PathBuf,
    roster: Vec<String>,
    layout: Vec<ColumnKey>,
    frames: usize,
}

impl CsvAngleSource {
    pub fn open(angles_path: &Path, roster_path: &Path) -> Result<Self, SourceError> {
        let roster_text = fs::read_to_string(roster_path).map_err(|e| SourceError::Io {
            path: roster_path.to_path_buf(),
            source: e,
        })?;
        let roster = parse_roster(&roster_text);

        let layout = CsvTable::read_rows(Self::reader(angles_path)?, Some(0..0))?
            .columns()
            .to_vec();
        let frames = count_rows(Self::reader(angles_path)?)?;

        debug!(
            path = %angles_path.display(),
            frames,
            columns = layout.len(),
            residues = roster.len(),
            "Opened CSV angle source."
        );

        Ok(Self {
            angles_path: angles_path.to_path_buf(),
            roster,
            layout,
            frames,
        })
    }

    fn reader(path: &Path) -> Result<BufReader<File>, SourceError> {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| SourceError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

impl AngleSource for CsvAngleSource {
    fn frame_count(&self) -> usize {
        self.frames
    }

    fn roster(&self) -> &[String] {
        &self.roster
    }

    fn layout(&self) -> &[ColumnKey] {
        &self.layout
    }

    fn angles(&self, start: usize, end: usize) -> Result<AngleTable, SourceError> {
        check_range(start, end, self.frames)?;
        let table = CsvTable::read_rows(Self::reader(&self.angles_path)?, Some(start..end))?;
        if table.n_rows() != end - start {
            return Err(SourceError::InvalidOutput(format!(
                "expected {} rows for frames {}..{}, read {}",
                end - start,
                start,
                end,
                table.n_rows()
            )));
        }
        // Dumps may number frames from any origin; the source addresses rows by position.
        Ok(table.rebased(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::angles::AngleFamily;
    use tempfile::tempdir;

    fn write_fixture(dir: &Path, frames: usize) -> (PathBuf, PathBuf) {
        let columns = ColumnKey::pairs_for([2, 3], AngleFamily::Backbone);
        let rows = (0..frames).map(|f| vec![f as f64, -(f as f64), 0.5, 1.5]);
        let table = AngleTable::from_rows(columns, 0, rows).unwrap();

        let angles = dir.join("angles.csv");
        let roster = dir.join("residues.txt");
        CsvTable::write_to_path(&table, &angles).unwrap();
        fs::write(&roster, "MET\nALA\nGLY\nLYS\n").unwrap();
        (angles, roster)
    }

    #[test]
    fn open_reads_layout_roster_and_frame_count() {
        let dir = tempdir().unwrap();
        let (angles, roster) = write_fixture(dir.path(), 25);
        let source = CsvAngleSource::open(&angles, &roster).unwrap();

        assert_eq!(source.frame_count(), 25);
        assert_eq!(source.roster().len(), 4);
        assert_eq!(source.layout().len(), 4);
        assert_eq!(source.layout()[0].to_string(), "2:phi");
    }

    #[test]
    fn angles_returns_exactly_the_requested_frames() {
        let dir = tempdir().unwrap();
        let (angles, roster) = write_fixture(dir.path(), 25);
        let source = CsvAngleSource::open(&angles, &roster).unwrap();

        let table = source.angles(10, 15).unwrap();
        assert_eq!(table.first_frame(), 10);
        assert_eq!(table.n_rows(), 5);
        assert_eq!(table.value(0, 0), 10.0);
        assert_eq!(table.value(4, 1), -14.0);

        assert!(matches!(
            source.angles(20, 30),
            Err(SourceError::OutOfRange { .. })
        ));
    }

    #[test]
    fn dumps_numbered_from_one_are_addressed_by_position() {
        let dir = tempdir().unwrap();
        let columns = ColumnKey::pairs_for([1], AngleFamily::Backbone);
        let rows = (1..=100).map(|f| vec![f as f64, 0.0]);
        let table = AngleTable::from_rows(columns, 1, rows).unwrap();
        let angles = dir.path().join("angles.csv");
        let roster = dir.path().join("residues.txt");
        CsvTable::write_to_path(&table, &angles).unwrap();
        fs::write(&roster, "GLY\n").unwrap();

        let source = CsvAngleSource::open(&angles, &roster).unwrap();
        assert_eq!(source.frame_count(), 100);
        let chunk = source.angles(0, 10).unwrap();
        assert_eq!(chunk.frames(), 0..10);
        assert_eq!(chunk.value(0, 0), 1.0);
        let tail = source.angles(75, 100).unwrap();
        assert_eq!(tail.frames(), 75..100);
        assert_eq!(tail.value(24, 0), 100.0);
    }

    #[test]
    fn missing_roster_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let (angles, _) = write_fixture(dir.path(), 3);
        let result = CsvAngleSource::open(&angles, &dir.path().join("nope.txt"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }
}
