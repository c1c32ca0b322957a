//! Sample command
//!
//! Prints per-patch averages as a table or JSON.

use crate::SampleArgs;
use anyhow::{Context, Result};
use chart_core::ChartLayout;
use tracing::trace;

pub fn run(args: SampleArgs, layout: &ChartLayout) -> Result<()> {
    trace!(input = %args.input.display(), json = args.json, "sample::run");

    let planes = super::load_planes(&args.input)?;
    let labels = super::labels_for(&planes, layout)?;
    let averages = chart_ops::sample_chart(&planes, &labels).context("Failed to sample chart")?;
    let report = averages.report(layout).context("Failed to build patch report")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:>5} {:>4} {:>4} {:>7}  {:>10} {:>10} {:>10}", "patch", "row", "col", "pixels", "R", "G", "B");
    for p in &report {
        match p.rgb {
            Some([r, g, b]) => println!(
                "{:>5} {:>4} {:>4} {:>7}  {:>10.6} {:>10.6} {:>10.6}",
                p.label, p.row, p.col, p.pixels, r, g, b
            ),
            None => println!(
                "{:>5} {:>4} {:>4} {:>7}  {:>10} {:>10} {:>10}",
                p.label, p.row, p.col, p.pixels, "-", "-", "-"
            ),
        }
    }
    Ok(())
}
