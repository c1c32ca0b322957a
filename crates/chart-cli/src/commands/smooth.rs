//! Smooth command
//!
//! Replaces every pixel with its patch mean, producing a noise-free
//! synthetic chart of the same size.

use crate::SmoothArgs;
use anyhow::{Context, Result};
use chart_core::ChartLayout;
use tracing::{info, trace};

pub fn run(args: SmoothArgs, layout: &ChartLayout, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), "smooth::run");

    let planes = super::load_planes(&args.input)?;
    let labels = super::labels_for(&planes, layout)?;
    let averages = chart_ops::sample_chart(&planes, &labels).context("Failed to sample chart")?;
    let chart = averages.make_chart(&labels).context("Failed to build synthetic chart")?;

    info!(patches = averages.patch_count(), "Smoothed chart");
    super::save_planes(&args.output, &chart)?;

    if verbose > 0 {
        println!("Wrote {}", args.output.display());
    }
    Ok(())
}
