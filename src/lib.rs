//! Post-processing of lid-driven cavity results: the nondimensional wall-shear
//! force on the lid for a sweep of Reynolds numbers.
//!
//! The pipeline reads a shared node file, rebuilds the cell-centered grid,
//! takes du/dy at the top wall from each case's velocity field and integrates
//! it along x. Each case writes a shear table and plot, and the sweep ends
//! with a plot of Fe against Re.

pub mod config;
pub mod error;
mod font;
pub mod io;
pub mod mesh;
pub mod pipeline;
pub mod plot;
pub mod shear;

pub use config::AnalysisConfig;
pub use error::{PostError, PostResult};
pub use pipeline::{run, ForceSample};
