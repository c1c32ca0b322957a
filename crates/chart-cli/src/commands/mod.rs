//! CLI command implementations

pub mod apply;
pub mod fit;
pub mod labels;
pub mod sample;
pub mod smooth;

use anyhow::{Context, Result};
use chart_core::{ChartLayout, LabelImage, RgbPlanes};
use std::path::Path;
use tracing::debug;

use crate::LayoutArgs;

/// Builds the chart layout from `--layout` or the individual flags.
pub fn resolve_layout(args: &LayoutArgs) -> Result<ChartLayout> {
    let layout = match args.layout_file {
        Some(ref path) => ChartLayout::from_yaml_file(path)
            .with_context(|| format!("Failed to load layout: {}", path.display()))?,
        None => ChartLayout::new(args.rows, args.cols, args.sample, args.x_squeeze, args.y_squeeze)
            .context("Invalid chart layout")?,
    };
    debug!(?layout, "Resolved chart layout");
    Ok(layout)
}

/// Load chart planes from path
pub fn load_planes(path: &Path) -> Result<RgbPlanes> {
    chart_io::read_planes(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save chart planes to path
pub fn save_planes(path: &Path, planes: &RgbPlanes) -> Result<()> {
    chart_io::write_planes(path, planes).with_context(|| format!("Failed to save: {}", path.display()))
}

/// Label image for a loaded chart.
pub fn labels_for(planes: &RgbPlanes, layout: &ChartLayout) -> Result<LabelImage> {
    chart_ops::compute_labels(planes.width(), planes.height(), layout)
        .context("Failed to label chart patches")
}
