use crate::core::models::table::AngleTable;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::Path;

/// Defines the interface for persisting angle tables.
///
/// Implementors must reload a table with the same row order, column order and
/// frame numbering it was written with (up to the precision of the format).
pub trait TableFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads the rows whose position in the file falls in `rows`, or every row
    /// when `rows` is `None`. Rows outside the range are skipped without being
    /// materialised.
    fn read_rows(reader: impl Read, rows: Option<Range<usize>>) -> Result<AngleTable, Self::Error>;

    /// Writes a table to a writer.
    fn write_to(table: &AngleTable, writer: impl Write) -> Result<(), Self::Error>;

    fn read_from(reader: impl Read) -> Result<AngleTable, Self::Error> {
        Self::read_rows(reader, None)
    }

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<AngleTable, Self::Error> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    fn write_to_path<P: AsRef<Path>>(table: &AngleTable, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(table, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
