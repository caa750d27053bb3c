use crate::cli::RunArgs;
use crate::config::{AppConfig, SourceSpec, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::PipelineProgress;
use mdavocado::{
    core::source::{AngleSource, CommandAngleSource, CsvAngleSource},
    engine::{artifacts::ArtifactStore, error::EngineError, progress::ProgressReporter},
    workflows,
};
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    info!("Building configuration from file and CLI arguments...");
    let config = build_config(&args.analysis, Some(&args.source))?;
    let compose = if args.compose {
        true
    } else if args.no_compose {
        false
    } else {
        config.compose.enabled
    };

    let source = open_source(&config)?;
    info!(
        frames = source.frame_count(),
        residues = source.roster().len(),
        "Angle source ready."
    );

    let progress = PipelineProgress::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    println!(
        "Analysing {} frames of {} residues in {} chunk(s)...",
        source.frame_count(),
        source.roster().len(),
        config.analysis.chunking.splits
    );
    let result = workflows::pipeline::run(
        source.as_ref(),
        &config.analysis,
        &config.output,
        &reporter,
    )?;

    println!(
        "✓ {} chunk(s) assembled into {}",
        result.chunks.len(),
        ArtifactStore::new(&config.output, 1).canonical_table().display()
    );
    println!(
        "  {} correlated angle(s), {} residue(s) segmented",
        result.correlations.len(),
        result.segmentations.len()
    );
    println!(
        "  {} chunk image(s), {} segment image(s)",
        result.chunk_images, result.segment_images
    );

    if compose {
        let composite = workflows::composite::run(
            &config.output,
            &config.compose.tool,
            config.compose.animate,
            &reporter,
        )?;
        super::compose::print_summary(&composite);
    }

    println!(
        "  {} file(s) written over {} phase(s) under {}",
        progress.artifacts_written(),
        progress.completed_phases().len(),
        config.output.display()
    );

    Ok(())
}

fn open_source(config: &AppConfig) -> Result<Box<dyn AngleSource>> {
    let spec = config.source.as_ref().ok_or_else(|| {
        CliError::Argument(
            "No angle source given. Pass --angles with --roster, --extractor, or set [source] in the config file."
                .to_string(),
        )
    })?;
    let source: Box<dyn AngleSource> = match spec {
        SourceSpec::Dump { angles, roster } => {
            info!("Reading angles from {:?} with roster {:?}", angles, roster);
            Box::new(CsvAngleSource::open(angles, roster).map_err(EngineError::from)?)
        }
        SourceSpec::Command { program, args } => {
            info!("Querying extractor {:?}", program);
            Box::new(CommandAngleSource::connect(program, args).map_err(EngineError::from)?)
        }
    };
    Ok(source)
}
