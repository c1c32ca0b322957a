//! chartmatrix - chart-based color matrix calibration
//!
//! Labels the patches of a photographed reference chart, averages them,
//! and fits the 3x3 matrix that maps one capture onto another.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

#[derive(Parser)]
#[command(name = "chartmatrix")]
#[command(author, version, about = "Chart-based color matrix calibration")]
#[command(long_about = "
Fits a 3x3 color matrix from two photographs of the same reference chart.

Examples:
  chartmatrix labels front.exr -o mask.exr            # Check patch placement
  chartmatrix sample front.exr --json                 # Per-patch averages
  chartmatrix smooth front.exr -o clean.exr           # Synthetic chart
  chartmatrix fit front.exr target.exr --clf m.clf --nuke m.nk
  chartmatrix apply shot.exr --clf m.clf -o shot_matched.exr
  chartmatrix --layout chart.yaml fit front.exr target.exr
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Average each patch and broadcast the means back (synthetic chart)
    Smooth(SmoothArgs),

    /// Print per-patch averages
    #[command(visible_alias = "s")]
    Sample(SampleArgs),

    /// Write a preview with unsampled pixels dimmed
    Labels(LabelsArgs),

    /// Fit a color matrix from a front and a target chart image
    #[command(visible_alias = "f")]
    Fit(FitArgs),

    /// Apply a CLF matrix to an image
    Apply(ApplyArgs),
}

/// Chart geometry, from a YAML file or individual flags.
#[derive(Args, Clone, Debug)]
struct LayoutArgs {
    /// Chart layout YAML file (rows, cols, sample_fraction, x_squeeze, y_squeeze)
    #[arg(long = "layout", global = true, value_name = "FILE")]
    layout_file: Option<PathBuf>,

    /// Patch rows
    #[arg(long, global = true, default_value_t = 4)]
    rows: u32,

    /// Patch columns
    #[arg(long, global = true, default_value_t = 6)]
    cols: u32,

    /// Half-width of the sampled window inside each cell (0.5 = whole cell)
    #[arg(long, global = true, default_value_t = 0.4)]
    sample: f64,

    /// Horizontal stretch about the image center
    #[arg(long, global = true, default_value_t = 0.0, allow_hyphen_values = true)]
    x_squeeze: f64,

    /// Vertical stretch about the image center
    #[arg(long, global = true, default_value_t = 0.0, allow_hyphen_values = true)]
    y_squeeze: f64,
}

#[derive(Args)]
struct SmoothArgs {
    /// Input chart image (EXR)
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct SampleArgs {
    /// Input chart image (EXR)
    input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LabelsArgs {
    /// Input chart image (EXR)
    input: PathBuf,

    /// Output preview image
    #[arg(short, long)]
    output: PathBuf,

    /// Brightness of unsampled pixels
    #[arg(long, default_value_t = 0.1)]
    dim: f32,
}

#[derive(Args)]
struct FitArgs {
    /// Chart as captured (EXR)
    front: PathBuf,

    /// Chart as it should look (EXR)
    target: PathBuf,

    /// Write a Nuke ColorMatrix node
    #[arg(long, value_name = "FILE")]
    nuke: Option<PathBuf>,

    /// Write a CLF ProcessList
    #[arg(long, value_name = "FILE")]
    clf: Option<PathBuf>,

    /// Write the front image with the matrix applied
    #[arg(long, value_name = "FILE")]
    corrected: Option<PathBuf>,
}

#[derive(Args)]
struct ApplyArgs {
    /// Input image (EXR)
    input: PathBuf,

    /// CLF file holding the matrix
    #[arg(long, value_name = "FILE")]
    clf: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    run(cli)
}

/// Dispatches a parsed command line. The chart layout is only resolved for
/// subcommands that label patches.
fn run(cli: Cli) -> Result<()> {
    let layout = || commands::resolve_layout(&cli.layout);
    match cli.command {
        Commands::Smooth(args) => commands::smooth::run(args, &layout()?, cli.verbose),
        Commands::Sample(args) => commands::sample::run(args, &layout()?),
        Commands::Labels(args) => commands::labels::run(args, &layout()?, cli.verbose),
        Commands::Fit(args) => commands::fit::run(args, &layout()?, cli.verbose),
        Commands::Apply(args) => commands::apply::run(args, cli.verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_layout_flags() {
        let cli = Cli::try_parse_from([
            "chartmatrix", "--rows", "5", "--x-squeeze", "-0.05", "sample", "chart.exr",
        ])
        .unwrap();
        assert_eq!(cli.layout.rows, 5);
        assert_eq!(cli.layout.cols, 6);
        assert_eq!(cli.layout.x_squeeze, -0.05);
        assert!(matches!(cli.command, Commands::Sample(_)));
    }

    #[test]
    fn test_apply_ignores_layout_flags() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("shot.exr");
        let clf = dir.path().join("m.clf");
        let output = dir.path().join("out.exr");
        chart_io::write_planes(&input, &chart_core::RgbPlanes::filled(4, 2, [0.25, 0.5, 1.0])).unwrap();
        std::fs::write(
            &clf,
            r#"<ProcessList id="x"><Matrix inBitDepth="32f" outBitDepth="32f">
                <Array dim="3 3">2 0 0 0 2 0 0 0 2</Array></Matrix></ProcessList>"#,
        )
        .unwrap();

        let arg = |p: &std::path::Path| p.to_string_lossy().into_owned();
        let cli = Cli::try_parse_from([
            "chartmatrix".to_string(),
            "--rows".into(),
            "0".into(),
            "--layout".into(),
            arg(&dir.path().join("missing.yaml")),
            "apply".into(),
            arg(&input),
            "--clf".into(),
            arg(&clf),
            "-o".into(),
            arg(&output),
        ])
        .unwrap();
        run(cli).unwrap();

        let out = chart_io::read_planes(&output).unwrap();
        assert_eq!(out.pixel(3, 1), Some([0.5, 1.0, 2.0]));
    }

    #[test]
    fn test_bad_layout_fails_patch_commands() {
        let cli = Cli::try_parse_from(["chartmatrix", "--rows", "0", "sample", "missing.exr"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid chart layout"), "{err:#}");
    }

    #[test]
    fn test_fit_args() {
        let cli = Cli::try_parse_from([
            "chartmatrix", "-vv", "fit", "front.exr", "target.exr", "--clf", "m.clf",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fit(args) => {
                assert_eq!(args.clf, Some(PathBuf::from("m.clf")));
                assert!(args.nuke.is_none());
            }
            _ => panic!("expected fit"),
        }
    }
}
