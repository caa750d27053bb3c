use crate::core::compose::{Compositor, ordered_images};
use crate::engine::artifacts::{ArtifactStore, ensure_parent};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

const CHUNK_PREFIX: &str = "chunk";

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeResult {
    /// One tiled image per chunk, in chunk order.
    pub montages: Vec<PathBuf>,
    pub animation: Option<PathBuf>,
}

/// Chunk image directories under `chunks_dir`, sorted by chunk number.
pub fn chunk_directories(chunks_dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let io_err = |e| EngineError::Io {
        path: chunks_dir.to_path_buf(),
        source: e,
    };
    let mut dirs: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(chunks_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_dir() {
            continue;
        }
        let index = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(CHUNK_PREFIX))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(index) = index {
            dirs.push((index, path));
        }
    }
    dirs.sort_by_key(|(index, _)| *index);
    Ok(dirs.into_iter().map(|(_, path)| path).collect())
}

/// Tiles every chunk's residue images into one montage and animates the
/// montages in chunk order.
#[instrument(skip_all, name = "composite_workflow", fields(output = %output.display()))]
pub fn run(
    output: &Path,
    compositor: &dyn Compositor,
    animate: bool,
    reporter: &ProgressReporter,
) -> Result<CompositeResult, EngineError> {
    let store = ArtifactStore::new(output, 1);
    let dirs = chunk_directories(&store.chunks_dir())?;
    if dirs.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "no rendered chunks found under '{}'",
            store.chunks_dir().display()
        )));
    }

    let montages = reporter.phase("Compositing chunks", || -> Result<_, EngineError> {
        reporter.report(Progress::TaskStart {
            total_steps: dirs.len() as u64,
        });
        let mut montages = Vec::with_capacity(dirs.len());
        for dir in &dirs {
            let images = ordered_images(dir)?;
            if images.is_empty() {
                warn!(dir = %dir.display(), "Chunk directory holds no residue images; skipped.");
                continue;
            }
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let path = store.montage(&name);
            ensure_parent(&path)?;
            compositor.montage(&images, &path)?;
            reporter.report(Progress::ArtifactWritten(path.clone()));
            reporter.report(Progress::TaskIncrement);
            montages.push(path);
        }
        reporter.report(Progress::TaskFinish);
        Ok(montages)
    })?;

    let animation = if animate && !montages.is_empty() {
        let path = store.animation();
        reporter.phase("Animating chunks", || compositor.animate(&montages, &path))?;
        reporter.report(Progress::ArtifactWritten(path.clone()));
        Some(path)
    } else {
        None
    };

    info!(montages = montages.len(), animated = animation.is_some(), "Compositing complete.");
    Ok(CompositeResult {
        montages,
        animation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compose::ComposeError;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingCompositor {
        montages: Mutex<Vec<(Vec<String>, PathBuf)>>,
        animations: Mutex<Vec<Vec<PathBuf>>>,
    }

    impl Compositor for RecordingCompositor {
        fn montage(&self, inputs: &[PathBuf], output: &Path) -> Result<(), ComposeError> {
            let names = inputs
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            self.montages
                .lock()
                .unwrap()
                .push((names, output.to_path_buf()));
            Ok(())
        }

        fn animate(&self, frames: &[PathBuf], _output: &Path) -> Result<(), ComposeError> {
            self.animations.lock().unwrap().push(frames.to_vec());
            Ok(())
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn chunks_are_composited_in_numeric_order() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 12);
        for chunk in [10, 2, 0] {
            for serial in [12, 3] {
                touch(&store.chunk_image(chunk, 11, serial));
            }
        }
        touch(&store.chunks_dir().join("notes.txt"));

        let compositor = RecordingCompositor::default();
        let result = run(dir.path(), &compositor, true, &ProgressReporter::new()).unwrap();

        let montages = compositor.montages.into_inner().unwrap();
        assert_eq!(montages.len(), 3);
        assert_eq!(montages[0].0, vec!["03.png", "12.png"]);
        let names: Vec<_> = result
            .montages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["chunk00.png", "chunk02.png", "chunk10.png"]);

        let animations = compositor.animations.into_inner().unwrap();
        assert_eq!(animations, vec![result.montages.clone()]);
        assert_eq!(result.animation, Some(store.animation()));
    }

    #[test]
    fn animation_is_optional() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path(), 1);
        touch(&store.chunk_image(0, 1, 1));

        let compositor = RecordingCompositor::default();
        let result = run(dir.path(), &compositor, false, &ProgressReporter::new()).unwrap();
        assert_eq!(result.montages.len(), 1);
        assert!(result.animation.is_none());
        assert!(compositor.animations.into_inner().unwrap().is_empty());
    }

    #[test]
    fn missing_chunks_are_an_input_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("chunks")).unwrap();
        let compositor = RecordingCompositor::default();
        let err = run(dir.path(), &compositor, true, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
