use crate::cli::ComposeArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::PipelineProgress;
use mdavocado::{
    engine::progress::ProgressReporter,
    workflows::composite::{self, CompositeResult},
};
use tracing::info;

pub fn run(args: ComposeArgs) -> Result<()> {
    let config = build_config(&args.analysis, None)?;
    let animate = config.compose.animate && !args.no_animation;

    let progress = PipelineProgress::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    info!(
        "Compositing chunk images with {:?}",
        config.compose.tool.montage_program
    );
    let result = composite::run(&config.output, &config.compose.tool, animate, &reporter)?;
    print_summary(&result);
    Ok(())
}

pub(super) fn print_summary(result: &CompositeResult) {
    println!("✓ {} montage(s) written", result.montages.len());
    if let Some(animation) = &result.animation {
        println!("  Animation written to: {}", animation.display());
    }
}
