//! Typed interface to external image compositing tools.
//!
//! Rendered images are tiled and animated by third-party programs. Callers hand
//! over explicit, ordered file lists; programs are spawned with an argument
//! vector and never through a shell.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("No input images for '{output}'", output = output.display())]
    NoInputs { output: PathBuf },
    #[error("Failed to list images in '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' exited with {status} while writing '{output}': {stderr}", output = output.display())]
    Failed {
        program: String,
        output: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Combines rendered images into composites.
pub trait Compositor: Sync {
    /// Tiles `inputs`, in the order given, into a single image.
    fn montage(&self, inputs: &[PathBuf], output: &Path) -> Result<(), ComposeError>;

    /// Assembles `frames`, in the order given, into an animation.
    fn animate(&self, frames: &[PathBuf], output: &Path) -> Result<(), ComposeError>;
}

/// ImageMagick's `montage` and `convert`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMagick {
    pub montage_program: PathBuf,
    pub convert_program: PathBuf,
    /// Images per montage row; `None` lets `montage` choose.
    pub tile_columns: Option<usize>,
    /// Delay between animation frames, in hundredths of a second.
    pub frame_delay: u32,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self {
            montage_program: PathBuf::from("montage"),
            convert_program: PathBuf::from("convert"),
            tile_columns: None,
            frame_delay: 50,
        }
    }
}

impl ImageMagick {
    pub fn montage_args(&self, inputs: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = inputs.iter().map(|p| p.as_os_str().to_owned()).collect();
        if let Some(columns) = self.tile_columns {
            args.push("-tile".into());
            args.push(format!("{columns}x").into());
        }
        args.push("-geometry".into());
        args.push("+2+2".into());
        args.push(output.as_os_str().to_owned());
        args
    }

    pub fn animate_args(&self, frames: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-delay".into(),
            self.frame_delay.to_string().into(),
            "-loop".into(),
            "0".into(),
        ];
        args.extend(frames.iter().map(|p| p.as_os_str().to_owned()));
        args.push(output.as_os_str().to_owned());
        args
    }

    fn invoke(&self, program: &Path, args: Vec<OsString>, output: &Path) -> Result<(), ComposeError> {
        let name = program.display().to_string();
        debug!(program = %name, output = %output.display(), "Invoking compositor.");
        let result = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ComposeError::Spawn {
                program: name.clone(),
                source: e,
            })?;
        if !result.status.success() {
            return Err(ComposeError::Failed {
                program: name,
                output: output.to_path_buf(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl Compositor for ImageMagick {
    #[instrument(skip_all, fields(output = %output.display(), inputs = inputs.len()))]
    fn montage(&self, inputs: &[PathBuf], output: &Path) -> Result<(), ComposeError> {
        if inputs.is_empty() {
            return Err(ComposeError::NoInputs {
                output: output.to_path_buf(),
            });
        }
        self.invoke(&self.montage_program, self.montage_args(inputs, output), output)
    }

    #[instrument(skip_all, fields(output = %output.display(), frames = frames.len()))]
    fn animate(&self, frames: &[PathBuf], output: &Path) -> Result<(), ComposeError> {
        if frames.is_empty() {
            return Err(ComposeError::NoInputs {
                output: output.to_path_buf(),
            });
        }
        self.invoke(&self.convert_program, self.animate_args(frames, output), output)
    }
}

/// PNG files directly inside `dir` whose stem is a number, sorted by that number.
pub fn ordered_images(dir: &Path) -> Result<Vec<PathBuf>, ComposeError> {
    let io_err = |e| ComposeError::Io {
        path: dir.to_path_buf(),
        source: e,
    };
    let mut images: Vec<(u64, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().is_none_or(|ext| ext != "png") {
            continue;
        }
        if let Some(index) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            images.push((index, path));
        }
    }
    images.sort_by_key(|(index, _)| *index);
    Ok(images.into_iter().map(|(_, path)| path).collect())
}
