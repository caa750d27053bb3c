use super::defaults::DefaultsConfig;
use super::file::{FileComposeConfig, FileConfig, FileFamily, FileSourceConfig, FileStructureConfig};
use super::models::{AppConfig, ComposeSettings, SourceSpec};
use crate::cli::{AnalysisArgs, FamilyArg, SourceArgs};
use crate::error::{CliError, Result};
use mdavocado::core::compose::ImageMagick;
use mdavocado::core::models::angles::AngleFamily;
use mdavocado::core::models::residue::ChainLayout;
use mdavocado::engine::config::AnalysisConfigBuilder;
use std::path::PathBuf;
use std::str::FromStr;

/// Layers defaults, the config file, `-S` overrides and command-line flags, in
/// increasing precedence.
pub fn build_config(args: &AnalysisArgs, source_args: Option<&SourceArgs>) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let structure = file_config.structure.take().unwrap_or_default();
    let family = match args.family {
        Some(FamilyArg::Backbone) => AngleFamily::Backbone,
        Some(FamilyArg::Sidechain) => AngleFamily::Sidechain,
        None => match structure.family.unwrap_or_default() {
            FileFamily::Backbone => AngleFamily::Backbone,
            FileFamily::Sidechain => AngleFamily::Sidechain,
        },
    };
    let chain_layout = merge_chain_layout(args.chains, structure, &defaults);

    let chunking = file_config.chunking.take().unwrap_or_default();
    let correlation = file_config.correlation.take().unwrap_or_default();
    let segmentation = file_config.segmentation.take().unwrap_or_default();
    let rendering = file_config.rendering.take().unwrap_or_default();

    let unwrap = if args.no_unwrap {
        false
    } else {
        segmentation.unwrap.unwrap_or(defaults.unwrap)
    };
    let rewrap = if args.no_rewrap {
        false
    } else {
        segmentation.rewrap.unwrap_or(defaults.rewrap)
    };
    let cumulative = args.cumulative || chunking.cumulative.unwrap_or(defaults.cumulative);

    let analysis = AnalysisConfigBuilder::new()
        .family(family)
        .chain_layout(chain_layout)
        .splits(args.splits.or(chunking.splits).unwrap_or(defaults.splits))
        .cumulative(cumulative)
        .threshold(
            args.threshold
                .or(correlation.threshold)
                .unwrap_or(defaults.threshold),
        )
        .block_rows(correlation.block_rows.unwrap_or(defaults.block_rows))
        .stride(args.stride.or(segmentation.stride).unwrap_or(defaults.stride))
        .window_width(
            args.window_width
                .or(segmentation.window_width)
                .unwrap_or(defaults.window_width),
        )
        .penalty(args.penalty.or(segmentation.penalty).unwrap_or(defaults.penalty))
        .unwrap(unwrap)
        .rewrap(rewrap)
        .canvas(
            rendering.width.unwrap_or(defaults.canvas_width),
            rendering.height.unwrap_or(defaults.canvas_height),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let source = merge_source(source_args, file_config.source.take().unwrap_or_default())?;
    let compose = merge_compose(file_config.compose.take().unwrap_or_default(), &defaults);

    Ok(AppConfig {
        output: args.output.clone(),
        source,
        analysis,
        compose,
    })
}

fn merge_chain_layout(
    cli_chains: Option<usize>,
    file_val: FileStructureConfig,
    defaults: &DefaultsConfig,
) -> ChainLayout {
    if let Some(chains) = cli_chains {
        return ChainLayout::Uniform { chains };
    }
    if let Some(lengths) = file_val.chain_lengths {
        return ChainLayout::Explicit { lengths };
    }
    ChainLayout::Uniform {
        chains: file_val.chains.unwrap_or(defaults.chains),
    }
}

fn merge_source(cli: Option<&SourceArgs>, file_val: FileSourceConfig) -> Result<Option<SourceSpec>> {
    if let Some(cli) = cli {
        if let Some(angles) = &cli.angles {
            let roster = cli
                .roster
                .clone()
                .or(file_val.roster)
                .ok_or_else(|| CliError::Argument("`--angles` requires `--roster`".to_string()))?;
            return Ok(Some(SourceSpec::Dump {
                angles: angles.clone(),
                roster,
            }));
        }
        if let Some(program) = &cli.extractor {
            let args = if cli.extractor_args.is_empty() {
                file_val.extractor_args.unwrap_or_default()
            } else {
                cli.extractor_args.clone()
            };
            return Ok(Some(SourceSpec::Command {
                program: program.clone(),
                args,
            }));
        }
    }

    match (file_val.angles, file_val.extractor) {
        (Some(_), Some(_)) => Err(CliError::Config(
            "`source.angles` and `source.extractor` are mutually exclusive".to_string(),
        )),
        (Some(angles), None) => {
            let roster = file_val.roster.ok_or_else(|| {
                CliError::Config("`source.angles` requires `source.roster`".to_string())
            })?;
            Ok(Some(SourceSpec::Dump { angles, roster }))
        }
        (None, Some(program)) => Ok(Some(SourceSpec::Command {
            program,
            args: file_val.extractor_args.unwrap_or_default(),
        })),
        (None, None) => Ok(None),
    }
}

fn merge_compose(file_val: FileComposeConfig, defaults: &DefaultsConfig) -> ComposeSettings {
    ComposeSettings {
        enabled: file_val.enabled.unwrap_or(defaults.compose),
        animate: file_val.animate.unwrap_or(defaults.animate),
        tool: ImageMagick {
            montage_program: file_val
                .montage
                .unwrap_or_else(|| PathBuf::from(defaults.montage_program)),
            convert_program: file_val
                .convert
                .unwrap_or_else(|| PathBuf::from(defaults.convert_program)),
            tile_columns: file_val.tile_columns,
            frame_delay: file_val.frame_delay.unwrap_or(defaults.frame_delay),
        },
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "source.angles" => {
                config.source.get_or_insert_with(Default::default).angles =
                    Some(PathBuf::from(value_str));
            }
            "source.roster" => {
                config.source.get_or_insert_with(Default::default).roster =
                    Some(PathBuf::from(value_str));
            }
            "source.extractor" => {
                config.source.get_or_insert_with(Default::default).extractor =
                    Some(PathBuf::from(value_str));
            }
            "structure.family" => {
                let family = match value_str {
                    "backbone" => FileFamily::Backbone,
                    "sidechain" => FileFamily::Sidechain,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid family for {}: {} (expected 'backbone' or 'sidechain')",
                            key, value_str
                        )));
                    }
                };
                config.structure.get_or_insert_with(Default::default).family = Some(family);
            }
            "structure.chains" => {
                config.structure.get_or_insert_with(Default::default).chains =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "chunking.splits" => {
                config.chunking.get_or_insert_with(Default::default).splits =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "chunking.cumulative" => {
                config.chunking.get_or_insert_with(Default::default).cumulative =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "correlation.threshold" => {
                config.correlation.get_or_insert_with(Default::default).threshold =
                    Some(parse_value(key, value_str, "float")?);
            }
            "correlation.block-rows" => {
                config.correlation.get_or_insert_with(Default::default).block_rows =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "segmentation.stride" => {
                config.segmentation.get_or_insert_with(Default::default).stride =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "segmentation.window-width" => {
                config
                    .segmentation
                    .get_or_insert_with(Default::default)
                    .window_width = Some(parse_value(key, value_str, "integer")?);
            }
            "segmentation.penalty" => {
                config.segmentation.get_or_insert_with(Default::default).penalty =
                    Some(parse_value(key, value_str, "float")?);
            }
            "segmentation.unwrap" => {
                config.segmentation.get_or_insert_with(Default::default).unwrap =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "segmentation.rewrap" => {
                config.segmentation.get_or_insert_with(Default::default).rewrap =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "rendering.width" => {
                config.rendering.get_or_insert_with(Default::default).width =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "rendering.height" => {
                config.rendering.get_or_insert_with(Default::default).height =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "compose.enabled" => {
                config.compose.get_or_insert_with(Default::default).enabled =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "compose.animate" => {
                config.compose.get_or_insert_with(Default::default).animate =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "compose.tile-columns" => {
                config.compose.get_or_insert_with(Default::default).tile_columns =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "compose.frame-delay" => {
                config.compose.get_or_insert_with(Default::default).frame_delay =
                    Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
