use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use mdavocado::engine::progress::{Progress, ProgressCallback};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const SPINNER_TICK_MS: u64 = 80;

/// What one pipeline phase produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    pub name: &'static str,
    pub artifacts: usize,
    pub last_artifact: Option<PathBuf>,
    pub elapsed: Duration,
}

struct ActivePhase {
    summary: PhaseSummary,
    started: Instant,
}

struct State {
    target: fn() -> ProgressDrawTarget,
    bar: ProgressBar,
    active: Option<ActivePhase>,
    completed: Vec<PhaseSummary>,
}

/// Terminal display for a pipeline run.
///
/// Each phase gets its own numbered spinner that turns into a counted bar when
/// the phase announces its task size. Written artifacts are tallied per phase;
/// a finished phase leaves a one-line summary above the next one.
#[derive(Clone)]
pub struct PipelineProgress {
    state: Arc<Mutex<State>>,
}

impl PipelineProgress {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr)
    }

    fn with_draw_target(target: fn() -> ProgressDrawTarget) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                target,
                bar: ProgressBar::hidden(),
                active: None,
                completed: Vec::new(),
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();
        Box::new(move |event: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };
            state.apply(event);
        })
    }

    /// Phases that ran to completion, in order.
    pub fn completed_phases(&self) -> Vec<PhaseSummary> {
        self.state
            .lock()
            .map(|s| s.completed.clone())
            .unwrap_or_default()
    }

    pub fn artifacts_written(&self) -> usize {
        self.completed_phases().iter().map(|p| p.artifacts).sum()
    }
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn apply(&mut self, event: Progress) {
        match event {
            Progress::PhaseStart { name } => self.start_phase(name),
            Progress::PhaseFinish => self.finish_phase(),
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.set_length(total_steps);
                self.bar.set_position(0);
                self.bar.set_style(bar_style());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = self.bar.length() {
                    self.bar.set_position(length);
                }
            }
            Progress::ArtifactWritten(path) => {
                debug!(path = %path.display(), "Artifact written.");
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.bar.set_message(name);
                if let Some(active) = &mut self.active {
                    active.summary.artifacts += 1;
                    active.summary.last_artifact = Some(path);
                }
            }
            Progress::Message(msg) => self.bar.println(format!("  {msg}")),
        }
    }

    fn start_phase(&mut self, name: &'static str) {
        // A phase that failed never sends its finish event.
        self.bar.finish_and_clear();
        let bar = ProgressBar::with_draw_target(None, (self.target)())
            .with_style(spinner_style())
            .with_prefix(format!("[{}] {name}", self.completed.len() + 1));
        bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        self.bar = bar;
        self.active = Some(ActivePhase {
            summary: PhaseSummary {
                name,
                artifacts: 0,
                last_artifact: None,
                elapsed: Duration::ZERO,
            },
            started: Instant::now(),
        });
    }

    fn finish_phase(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let mut summary = active.summary;
        summary.elapsed = active.started.elapsed();
        if let Some(last) = &summary.last_artifact {
            debug!(phase = summary.name, last = %last.display(), "Phase finished.");
        }
        self.bar.println(format!(
            "✓ {:<24} {} file(s) in {:.1}s",
            summary.name,
            summary.artifacts,
            summary.elapsed.as_secs_f64()
        ));
        self.bar.finish_and_clear();
        self.completed.push(summary);
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {prefix} {msg:.dim}")
        .expect("Failed to create spinner style template")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("  {prefix:<28} [{bar:32.cyan/blue}] {pos}/{len} {msg:.dim}")
        .expect("Failed to create bar style template")
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::thread;

    fn quiet() -> PipelineProgress {
        PipelineProgress::with_draw_target(ProgressDrawTarget::hidden)
    }

    fn bar(progress: &PipelineProgress) -> ProgressBar {
        progress.state.lock().unwrap().bar.clone()
    }

    #[test]
    fn nothing_is_recorded_before_the_first_phase() {
        let progress = quiet();
        assert!(progress.completed_phases().is_empty());
        assert_eq!(progress.artifacts_written(), 0);
        assert!(progress.state.lock().unwrap().active.is_none());
    }

    #[test]
    fn phases_are_numbered_and_count_their_artifacts() {
        let progress = quiet();
        let callback = progress.get_callback();

        callback(Progress::PhaseStart {
            name: "Extracting chunks",
        });
        assert_eq!(bar(&progress).prefix(), "[1] Extracting chunks");

        callback(Progress::TaskStart { total_steps: 4 });
        for start in [0, 25, 50, 75] {
            callback(Progress::ArtifactWritten(PathBuf::from(format!(
                "out/tables/angles_{start}_{}.csv",
                start + 25
            ))));
            callback(Progress::TaskIncrement);
        }
        assert_eq!(bar(&progress).position(), 4);
        assert_eq!(bar(&progress).message(), "angles_75_100.csv");
        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);

        callback(Progress::PhaseStart {
            name: "Assembling table",
        });
        assert_eq!(bar(&progress).prefix(), "[2] Assembling table");
        callback(Progress::ArtifactWritten(PathBuf::from("out/angles.csv")));
        callback(Progress::PhaseFinish);

        let phases = progress.completed_phases();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].name, "Extracting chunks");
        assert_eq!(phases[0].artifacts, 4);
        assert_eq!(
            phases[1].last_artifact.as_deref(),
            Some(Path::new("out/angles.csv"))
        );
        assert_eq!(progress.artifacts_written(), 5);
    }

    #[test]
    fn task_finish_fills_the_bar() {
        let progress = quiet();
        let callback = progress.get_callback();

        callback(Progress::PhaseStart {
            name: "Rendering chunks",
        });
        callback(Progress::TaskStart { total_steps: 20 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskFinish);

        let bar = bar(&progress);
        assert_eq!(bar.length(), Some(20));
        assert_eq!(bar.position(), 20);
    }

    #[test]
    fn failed_phase_is_not_reported_as_completed() {
        let progress = quiet();
        let callback = progress.get_callback();

        callback(Progress::PhaseStart {
            name: "Detecting change points",
        });
        callback(Progress::ArtifactWritten(PathBuf::from("out/breakpoints.json")));
        callback(Progress::PhaseStart {
            name: "Rendering segments",
        });
        callback(Progress::PhaseFinish);

        let phases = progress.completed_phases();
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].name, "Rendering segments");
        assert_eq!(phases[0].artifacts, 0);
    }

    #[test]
    fn stray_finish_without_a_phase_is_ignored() {
        let progress = quiet();
        let callback = progress.get_callback();
        callback(Progress::PhaseFinish);
        callback(Progress::Message("3 residues correlated".to_string()));
        assert!(progress.completed_phases().is_empty());
    }

    #[test]
    fn callback_is_usable_from_worker_threads() {
        let progress = quiet();
        let callback = progress.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Rendering chunks",
            });
            callback(Progress::ArtifactWritten(PathBuf::from("out/chunks/chunk0/1.png")));
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert_eq!(progress.artifacts_written(), 1);
    }
}
