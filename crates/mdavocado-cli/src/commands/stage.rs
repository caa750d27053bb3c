use crate::cli::StageArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::PipelineProgress;
use mdavocado::{engine::progress::ProgressReporter, workflows::pipeline};
use tracing::info;

/// A single pipeline stage run against a previously assembled table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Correlate,
    Segment,
    Render,
}

pub fn run(stage: Stage, args: StageArgs) -> Result<()> {
    let config = build_config(&args.analysis, None)?;

    info!("Loading canonical table from {:?}", &config.output);
    let analysis = pipeline::load(&config.output, &config.analysis)?;

    let progress = PipelineProgress::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    match stage {
        Stage::Correlate => {
            let map = pipeline::correlate(&analysis, &config.analysis, &reporter)?;
            println!(
                "✓ {} correlated angle(s) written to {}",
                map.len(),
                analysis.store.correlations().display()
            );
        }
        Stage::Segment => {
            let (segmentations, images) =
                pipeline::segment(&analysis, &config.analysis, &reporter)?;
            let breaks: usize = segmentations
                .iter()
                .map(|s| s.breakpoints.changes().len())
                .sum();
            println!(
                "✓ {} residue(s) segmented, {} change point(s), {} segment image(s)",
                segmentations.len(),
                breaks,
                images
            );
        }
        Stage::Render => {
            let images = pipeline::render(&analysis, &config.analysis, &reporter)?;
            println!(
                "✓ {} chunk image(s) written under {}",
                images,
                analysis.store.chunks_dir().display()
            );
        }
    }
    Ok(())
}
