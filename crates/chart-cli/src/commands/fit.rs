//! Fit command
//!
//! Samples a front and a target chart with the same layout, fits the
//! matrix between them, and writes the requested exports.

use crate::FitArgs;
use anyhow::{Context, Result, ensure};
use chart_core::ChartLayout;
use tracing::{info, trace, warn};

pub fn run(args: FitArgs, layout: &ChartLayout, verbose: u8) -> Result<()> {
    trace!(front = %args.front.display(), target = %args.target.display(), "fit::run");

    let front = super::load_planes(&args.front)?;
    let target = super::load_planes(&args.target)?;
    ensure!(
        front.dimensions() == target.dimensions(),
        "front is {}x{} but target is {}x{}",
        front.width(),
        front.height(),
        target.width(),
        target.height()
    );

    let labels = super::labels_for(&front, layout)?;
    let front_avg = chart_ops::sample_chart(&front, &labels).context("Failed to sample front chart")?;
    let target_avg = chart_ops::sample_chart(&target, &labels).context("Failed to sample target chart")?;

    let fit = chart_ops::fit(&front_avg, &target_avg).context("Failed to fit color matrix")?;
    if !fit.rejected.is_empty() {
        warn!(rejected = ?fit.rejected, "Patches excluded from the fit");
    }
    info!(used = fit.used, rms_error = fit.rms_error, "Fitted color matrix");

    for row in (0..3).map(|i| fit.matrix.row(i)) {
        println!("{:>12.8} {:>12.8} {:>12.8}", row[0], row[1], row[2]);
    }
    if verbose > 0 {
        println!(
            "patches used: {}, rejected: {:?}, rms error: {:.6}",
            fit.used, fit.rejected, fit.rms_error
        );
    }

    if let Some(ref path) = args.nuke {
        chart_export::write_color_matrix(path, &fit.matrix)
            .with_context(|| format!("Failed to write Nuke node: {}", path.display()))?;
        info!(path = %path.display(), "Wrote Nuke ColorMatrix");
    }
    if let Some(ref path) = args.clf {
        chart_export::write_transform_document(path, &fit.matrix)
            .with_context(|| format!("Failed to write CLF: {}", path.display()))?;
        info!(path = %path.display(), "Wrote CLF");
    }
    if let Some(ref path) = args.corrected {
        let corrected = chart_ops::apply_matrix(&front, &fit.matrix).context("Failed to apply matrix")?;
        super::save_planes(path, &corrected)?;
    }
    Ok(())
}
