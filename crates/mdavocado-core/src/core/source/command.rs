use super::{AngleSource, SourceError, check_range, parse_roster};
use crate::core::io::csv_table::CsvTable;
use crate::core::io::traits::TableFile;
use crate::core::models::table::{AngleTable, ColumnKey};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, instrument};

/// Angles from an external extractor program.
///
/// The program is invoked with a fixed argument prefix followed by one query:
///
/// - `frames`: prints the total frame count.
/// - `roster`: prints one residue name per line.
/// - `angles --start A --end B`: prints the table CSV for frames `A..B`.
///
/// Arguments are passed as a vector; no shell is involved.
#[derive(Debug, Clone)]
pub struct CommandAngleSource {
    program: PathBuf,
    args: Vec<String>,
    roster: Vec<String>,
    layout: Vec<ColumnKey>,
    frames: usize,
}

impl CommandAngleSource {
    #[instrument(skip_all, fields(program = %program.display()))]
    pub fn connect(program: &Path, args: &[String]) -> Result<Self, SourceError> {
        let mut source = Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
            roster: Vec::new(),
            layout: Vec::new(),
            frames: 0,
        };

        let frames_text = source.query(&["frames"])?;
        source.frames = frames_text.trim().parse().map_err(|_| {
            SourceError::InvalidOutput(format!("'{}' is not a frame count", frames_text.trim()))
        })?;
        source.roster = parse_roster(&source.query(&["roster"])?);
        source.layout = source.fetch(0, 0)?.columns().to_vec();

        debug!(
            frames = source.frames,
            residues = source.roster.len(),
            columns = source.layout.len(),
            "Connected to external angle provider."
        );
        Ok(source)
    }

    pub(crate) fn query_args(&self, query: &[&str]) -> Vec<String> {
        self.args
            .iter()
            .cloned()
            .chain(query.iter().map(|s| s.to_string()))
            .collect()
    }

    fn query(&self, query: &[&str]) -> Result<String, SourceError> {
        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .args(self.query_args(query))
            .output()
            .map_err(|e| SourceError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(SourceError::Command {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout)
            .map_err(|_| SourceError::InvalidOutput("output is not valid UTF-8".to_string()))
    }

    fn fetch(&self, start: usize, end: usize) -> Result<AngleTable, SourceError> {
        let start_arg = start.to_string();
        let end_arg = end.to_string();
        let text = self.query(&["angles", "--start", &start_arg, "--end", &end_arg])?;
        Ok(CsvTable::read_from(text.as_bytes())?)
    }
}

impl AngleSource for CommandAngleSource {
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
        let table = self.fetch(start, end)?;
        if table.n_rows() != end - start || (!table.is_empty() && table.first_frame() != start) {
            return Err(SourceError::InvalidOutput(format!(
                "provider returned frames {:?} for request {}..{}",
                table.frames(),
                start,
                end
            )));
        }
        if table.columns() != self.layout.as_slice() {
            return Err(SourceError::InvalidOutput(
                "column layout changed between requests".to_string(),
            ));
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_args_append_the_query_to_the_fixed_prefix() {
        let source = CommandAngleSource {
            program: PathBuf::from("extract-dihedrals"),
            args: vec!["top.pdb".to_string(), "traj.dcd".to_string()],
            roster: Vec::new(),
            layout: Vec::new(),
            frames: 0,
        };
        assert_eq!(
            source.query_args(&["angles", "--start", "0", "--end", "10"]),
            vec!["top.pdb", "traj.dcd", "angles", "--start", "0", "--end", "10"]
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let result = CommandAngleSource::connect(
            Path::new("/nonexistent/mdavocado-extractor"),
            &[],
        );
        assert!(matches!(result, Err(SourceError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_exit_status() {
        let result = CommandAngleSource::connect(Path::new("false"), &[]);
        assert!(matches!(result, Err(SourceError::Command { .. })));
    }
}
