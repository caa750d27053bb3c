use super::traits::TableFile;
use crate::core::models::table::{AngleTable, ColumnKey, TableError};
use std::io::{self, Read, Write};
use std::ops::Range;
use thiserror::Error;

const FRAME_HEADER: &str = "frame";

#[derive(Debug, Error)]
pub enum TableIoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("Missing leading 'frame' column in header")]
    MissingFrameColumn,
    #[error("Invalid number '{value}' on record {record}")]
    InvalidNumber { record: usize, value: String },
    #[error("Frame numbers are not contiguous on record {record}: expected {expected}, found {found}")]
    NonContiguousFrames {
        record: usize,
        expected: usize,
        found: usize,
    },
}

/// Full-precision CSV table: a `frame` column followed by one `serial:kind`
/// column per angle.
pub struct CsvTable;

/// Same layout as [`CsvTable`], values rounded to single precision.
pub struct CompactCsvTable;

impl TableFile for CsvTable {
    type Error = TableIoError;

    fn read_rows(reader: impl Read, rows: Option<Range<usize>>) -> Result<AngleTable, Self::Error> {
        read_csv_rows(reader, rows)
    }

    fn write_to(table: &AngleTable, writer: impl Write) -> Result<(), Self::Error> {
        write_csv(table, writer, |v| v.to_string())
    }
}

impl TableFile for CompactCsvTable {
    type Error = TableIoError;

    fn read_rows(reader: impl Read, rows: Option<Range<usize>>) -> Result<AngleTable, Self::Error> {
        read_csv_rows(reader, rows)
    }

    fn write_to(table: &AngleTable, writer: impl Write) -> Result<(), Self::Error> {
        write_csv(table, writer, |v| (v as f32).to_string())
    }
}

/// Counts the data records of a table file without parsing the values.
pub fn count_rows(reader: impl Read) -> Result<usize, TableIoError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut record = csv::ByteRecord::new();
    let mut count = 0;
    while csv_reader.read_byte_record(&mut record)? {
        count += 1;
    }
    Ok(count)
}

fn parse_header(headers: &csv::StringRecord) -> Result<Vec<ColumnKey>, TableIoError> {
    let mut fields = headers.iter();
    if fields.next().map(str::trim) != Some(FRAME_HEADER) {
        return Err(TableIoError::MissingFrameColumn);
    }
    fields
        .map(|h| h.parse::<ColumnKey>().map_err(TableIoError::from))
        .collect()
}

fn parse_number<T: std::str::FromStr>(value: &str, record: usize) -> Result<T, TableIoError> {
    value
        .trim()
        .parse()
        .map_err(|_| TableIoError::InvalidNumber {
            record,
            value: value.to_string(),
        })
}

fn read_csv_rows(reader: impl Read, rows: Option<Range<usize>>) -> Result<AngleTable, TableIoError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let columns = parse_header(csv_reader.headers()?)?;
    let mut table: Option<AngleTable> = None;
    let mut expected_frame: Option<usize> = None;
    let mut buffer = Vec::with_capacity(columns.len());
    let mut record = csv::StringRecord::new();
    let mut index = 0;

    while csv_reader.read_record(&mut record)? {
        let current = index;
        index += 1;
        if let Some(range) = &rows {
            if current < range.start {
                continue;
            }
            if current >= range.end {
                break;
            }
        }

        let frame: usize = parse_number(&record[0], current)?;
        if let Some(expected) = expected_frame {
            if frame != expected {
                return Err(TableIoError::NonContiguousFrames {
                    record: current,
                    expected,
                    found: frame,
                });
            }
        }
        expected_frame = Some(frame + 1);

        buffer.clear();
        for value in record.iter().skip(1) {
            buffer.push(parse_number::<f64>(value, current)?);
        }
        table
            .get_or_insert_with(|| AngleTable::new(columns.clone(), frame))
            .push_row(&buffer)?;
    }

    let start = rows.map_or(0, |r| r.start);
    Ok(table.unwrap_or_else(|| AngleTable::new(columns, start)))
}

fn write_csv(
    table: &AngleTable,
    writer: impl Write,
    format_value: impl Fn(f64) -> String,
) -> Result<(), TableIoError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.n_cols() + 1);
    header.push(FRAME_HEADER.to_string());
    header.extend(table.columns().iter().map(ColumnKey::to_string));
    csv_writer.write_record(&header)?;

    let mut record = Vec::with_capacity(table.n_cols() + 1);
    for (offset, row) in table.rows().enumerate().take(table.n_rows()) {
        record.clear();
        record.push((table.first_frame() + offset).to_string());
        record.extend(row.iter().map(|&v| format_value(v)));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::angles::AngleFamily;
    use tempfile::tempdir;

    fn sample_table(first_frame: usize) -> AngleTable {
        let columns = ColumnKey::pairs_for([2, 3], AngleFamily::Backbone);
        let rows = (0..4).map(|r| vec![-179.5 + r as f64, 0.1 * r as f64, 33.333333333, -0.25]);
        AngleTable::from_rows(columns, first_frame, rows).unwrap()
    }

    #[test]
    fn full_precision_round_trip_is_exact() {
        let table = sample_table(100);
        let mut buffer = Vec::new();
        CsvTable::write_to(&table, &mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("frame,2:phi,2:psi,3:phi,3:psi\n100,"));

        let reloaded = CsvTable::read_from(buffer.as_slice()).unwrap();
        assert_eq!(reloaded, table);
    }

    #[test]
    fn compact_round_trip_is_within_single_precision() {
        let table = sample_table(0);
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        CompactCsvTable::write_to_path(&table, &path).unwrap();

        let reloaded = CompactCsvTable::read_from_path(&path).unwrap();
        assert_eq!(reloaded.columns(), table.columns());
        assert_eq!(reloaded.n_rows(), table.n_rows());
        for r in 0..table.n_rows() {
            for c in 0..table.n_cols() {
                assert!((reloaded.value(r, c) - table.value(r, c)).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn read_rows_only_materialises_the_requested_range() {
        let table = sample_table(10);
        let mut buffer = Vec::new();
        CsvTable::write_to(&table, &mut buffer).unwrap();

        let part = CsvTable::read_rows(buffer.as_slice(), Some(1..3)).unwrap();
        assert_eq!(part.first_frame(), 11);
        assert_eq!(part.n_rows(), 2);
        assert_eq!(part.row(0), table.row(1));

        let empty = CsvTable::read_rows(buffer.as_slice(), Some(7..9)).unwrap();
        assert!(empty.is_empty());
        assert_eq!(count_rows(buffer.as_slice()).unwrap(), 4);
    }

    #[test]
    fn missing_frame_column_is_rejected() {
        let data = "2:phi,2:psi\n1.0,2.0\n";
        assert!(matches!(
            CsvTable::read_from(data.as_bytes()),
            Err(TableIoError::MissingFrameColumn)
        ));
    }

    #[test]
    fn gaps_in_frame_numbers_are_rejected() {
        let data = "frame,2:phi,2:psi\n0,1.0,2.0\n2,1.0,2.0\n";
        assert!(matches!(
            CsvTable::read_from(data.as_bytes()),
            Err(TableIoError::NonContiguousFrames {
                record: 1,
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn malformed_values_report_their_record() {
        let data = "frame,2:phi,2:psi\n0,1.0,abc\n";
        assert!(matches!(
            CsvTable::read_from(data.as_bytes()),
            Err(TableIoError::InvalidNumber { record: 0, .. })
        ));
    }
}
