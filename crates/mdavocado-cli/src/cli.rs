use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "MDavocado Developers",
    version,
    about = "MDavocado CLI - Chunked dihedral-angle analysis of molecular dynamics trajectories: density maps, circular correlation and change-point segmentation.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract angles chunk by chunk, then correlate, segment and render everything.
    Run(RunArgs),
    /// Compute the circular correlation of an existing canonical angle table.
    Correlate(StageArgs),
    /// Detect change points per residue in an existing canonical angle table.
    Segment(StageArgs),
    /// Render per-chunk density images from an existing canonical angle table.
    Render(StageArgs),
    /// Tile rendered chunk images and animate them with external tools.
    Compose(ComposeArgs),
}

/// The dihedral pair tracked for every residue.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    /// phi/psi over [-180, 180]
    Backbone,
    /// chi1/chi2 over [0, 360]
    Sidechain,
}

/// Where per-frame angles come from. Overrides the `[source]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Pre-extracted angle table (CSV with a `frame` column and `serial:kind` columns).
    #[arg(long, value_name = "PATH", requires = "roster", conflicts_with = "extractor")]
    pub angles: Option<PathBuf>,

    /// Residue names, one per line, in serial order.
    #[arg(long, value_name = "PATH")]
    pub roster: Option<PathBuf>,

    /// External program answering `frames`, `roster` and `angles --start A --end B`.
    #[arg(long, value_name = "PROGRAM")]
    pub extractor: Option<PathBuf>,

    /// Argument passed to the extractor before every query. Can be repeated.
    #[arg(long = "extractor-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extractor_args: Vec<String>,
}

/// Options shared by every analysis command.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Directory all artifacts are written to (and read from).
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the tracked angle family.
    #[arg(long, value_enum)]
    pub family: Option<FamilyArg>,

    /// Override the number of equally long chains the residues are split into.
    #[arg(long, value_name = "INT")]
    pub chains: Option<usize>,

    /// Override the number of trajectory chunks.
    #[arg(short = 'k', long, value_name = "INT")]
    pub splits: Option<usize>,

    /// Render chunk images cumulatively (chunk i covers frames 0..end of chunk i).
    #[arg(long)]
    pub cumulative: bool,

    /// Override the correlation magnitude threshold.
    #[arg(short, long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    /// Override the frame stride used for change-point detection.
    #[arg(long, value_name = "INT")]
    pub stride: Option<usize>,

    /// Override the change-point window width, in strided samples.
    #[arg(long, value_name = "INT")]
    pub window_width: Option<usize>,

    /// Override the change-point penalty.
    #[arg(long, value_name = "FLOAT")]
    pub penalty: Option<f64>,

    /// Detect change points on the raw periodic angles.
    #[arg(long)]
    pub no_unwrap: bool,

    /// Keep unwrapped angles unbounded instead of folding them into (-360, 360).
    #[arg(long)]
    pub no_rewrap: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S segmentation.penalty=5000
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Composite the chunk images after rendering, even if `[compose]` is disabled.
    #[arg(long, conflicts_with = "no_compose")]
    pub compose: bool,

    /// Skip compositing, even if `[compose]` is enabled.
    #[arg(long)]
    pub no_compose: bool,
}

/// Arguments for the single-stage subcommands.
#[derive(Args, Debug, Clone)]
pub struct StageArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

/// Arguments for the `compose` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Only build the per-chunk montages.
    #[arg(long)]
    pub no_animation: bool,
}
