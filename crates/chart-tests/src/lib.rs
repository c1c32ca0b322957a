//! Integration tests for the chart calibration crates.
//!
//! These run the whole pipeline through real files: synthetic chart EXRs
//! are written, read back, labeled, sampled and fitted, and the exported
//! matrices are read back and applied.
