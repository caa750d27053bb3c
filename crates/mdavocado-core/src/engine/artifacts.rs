use super::error::EngineError;
use crate::core::source::parse_roster;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const CANONICAL_TABLE: &str = "angles.csv";
const ROSTER: &str = "roster.txt";
const CORRELATIONS: &str = "correlations.json";
const BREAKPOINTS: &str = "breakpoints.json";
const ANIMATION: &str = "chunks.gif";

/// Number of decimal digits needed to print every value in `0..=max`.
pub fn digits(max: usize) -> usize {
    max.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Locations of every file the pipeline produces under one output directory.
///
/// Numeric path components are zero-padded to a fixed width so lexicographic and
/// numeric ordering agree for downstream tools that glob the images.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    serial_width: usize,
}

impl ArtifactStore {
    /// `residues` is the highest residue serial that will be written.
    pub fn new(root: impl Into<PathBuf>, residues: usize) -> Self {
        Self {
            root: root.into(),
            serial_width: digits(residues),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chunk_table(&self, start: usize, end: usize) -> PathBuf {
        self.root
            .join("tables")
            .join(format!("angles_{start}_{end}.csv"))
    }

    pub fn canonical_table(&self) -> PathBuf {
        self.root.join(CANONICAL_TABLE)
    }

    pub fn roster(&self) -> PathBuf {
        self.root.join(ROSTER)
    }

    pub fn correlations(&self) -> PathBuf {
        self.root.join(CORRELATIONS)
    }

    pub fn breakpoints(&self) -> PathBuf {
        self.root.join(BREAKPOINTS)
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn chunk_dir(&self, chunk: usize, chunks: usize) -> PathBuf {
        self.chunks_dir()
            .join(format!("chunk{:0w$}", chunk, w = digits(chunks.saturating_sub(1))))
    }

    pub fn chunk_image(&self, chunk: usize, chunks: usize, serial: usize) -> PathBuf {
        self.chunk_dir(chunk, chunks)
            .join(format!("{}.png", self.serial_name(serial)))
    }

    pub fn segment_image(&self, serial: usize, segment: usize, segments: usize) -> PathBuf {
        self.root
            .join("segments")
            .join(self.serial_name(serial))
            .join(format!(
                "{:0w$}.png",
                segment,
                w = digits(segments.saturating_sub(1))
            ))
    }

    pub fn breakpoint_plot(&self, serial: usize) -> PathBuf {
        self.root
            .join("breakpoints")
            .join(format!("{}.svg", self.serial_name(serial)))
    }

    pub fn montage(&self, chunk_dir_name: &str) -> PathBuf {
        self.root
            .join("montages")
            .join(format!("{chunk_dir_name}.png"))
    }

    pub fn animation(&self) -> PathBuf {
        self.root.join(ANIMATION)
    }

    fn serial_name(&self, serial: usize) -> String {
        format!("{:0w$}", serial, w = self.serial_width)
    }
}

/// Creates the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<(), EngineError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| EngineError::Io {
                path: dir.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), EngineError> {
    ensure_parent(path)?;
    let io_err = |e| EngineError::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| EngineError::Serialization {
        path: path.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(io_err)
}

pub fn write_roster(names: &[String], path: &Path) -> Result<(), EngineError> {
    ensure_parent(path)?;
    let mut text = names.join("\n");
    text.push('\n');
    fs::write(path, text).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn read_roster(path: &Path) -> Result<Vec<String>, EngineError> {
    let text = fs::read_to_string(path).map_err(|e| EngineError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(parse_roster(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn digits_counts_decimal_places() {
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(999), 3);
        assert_eq!(digits(1000), 4);
    }

    #[test]
    fn image_names_sort_lexicographically_in_numeric_order() {
        let store = ArtifactStore::new("out", 120);
        let mut paths: Vec<PathBuf> = [100, 7, 21]
            .iter()
            .map(|&s| store.chunk_image(3, 12, s))
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out/chunks/chunk03/007.png"),
                PathBuf::from("out/chunks/chunk03/021.png"),
                PathBuf::from("out/chunks/chunk03/100.png"),
            ]
        );
    }

    #[test]
    fn segment_images_are_keyed_by_serial_and_segment() {
        let store = ArtifactStore::new("out", 9);
        assert_eq!(
            store.segment_image(4, 2, 11),
            PathBuf::from("out/segments/4/02.png")
        );
        assert_eq!(store.breakpoint_plot(4), PathBuf::from("out/breakpoints/4.svg"));
        assert_eq!(
            store.chunk_table(100, 200),
            PathBuf::from("out/tables/angles_100_200.csv")
        );
    }

    #[test]
    fn roster_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("roster.txt");
        let names = vec!["MET".to_string(), "GLY".to_string()];
        write_roster(&names, &path).unwrap();
        assert_eq!(read_roster(&path).unwrap(), names);
    }
}
