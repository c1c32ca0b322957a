//! Apply command
//!
//! Multiplies every pixel of an image by the matrix in a CLF file.

use crate::ApplyArgs;
use anyhow::{Context, Result};
use tracing::{info, trace};

pub fn run(args: ApplyArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), clf = %args.clf.display(), "apply::run");

    let matrix = chart_export::read_matrix_clf(&args.clf)
        .with_context(|| format!("Failed to read matrix: {}", args.clf.display()))?;
    info!(?matrix, "Loaded color matrix");

    let planes = super::load_planes(&args.input)?;
    let out = chart_ops::apply_matrix(&planes, &matrix).context("Failed to apply matrix")?;
    super::save_planes(&args.output, &out)?;

    if verbose > 0 {
        println!("Wrote {}", args.output.display());
    }
    Ok(())
}
