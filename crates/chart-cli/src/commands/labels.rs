//! Labels command
//!
//! Writes the chart with every unsampled pixel dimmed, to check the
//! layout against a real photograph.

use crate::LabelsArgs;
use anyhow::{Context, Result};
use chart_core::ChartLayout;
use tracing::{info, trace};

pub fn run(args: LabelsArgs, layout: &ChartLayout, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), dim = args.dim, "labels::run");

    let planes = super::load_planes(&args.input)?;
    let labels = super::labels_for(&planes, layout)?;
    let preview = chart_ops::patch_map::preview(&planes, &labels, args.dim)
        .context("Failed to build label preview")?;
    super::save_planes(&args.output, &preview)?;

    let assigned = labels.assigned_count();
    let total = planes.width() * planes.height();
    info!(assigned, total, "Wrote label preview");

    if verbose > 0 {
        println!(
            "{} of {} pixels sampled ({:.1}%)",
            assigned,
            total,
            100.0 * assigned as f64 / total.max(1) as f64
        );
    }
    Ok(())
}
