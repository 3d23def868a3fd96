use std::fs;

use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::{PostError, PostResult};
use crate::io;
use crate::mesh::{CellGrid, Mesh};
use crate::plot::{Figure, Series, BLUE, TAB_BLUE};
use crate::shear::{self, WallShear};

/// Force coefficient of one case, in processing order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceSample {
    pub re: u32,
    pub fe: f64,
}

/// Runs the whole post-processing sweep: mesh, cell grid, every listed Reynolds number, then the summary plot.
/// The first failure aborts the run.
pub fn run(config: &AnalysisConfig) -> PostResult<Vec<ForceSample>> {
    fs::create_dir_all(&config.output_dir).map_err(|e| PostError::io(&config.output_dir, e))?;

    let mesh = Mesh::load(&config.mesh_file)?;
    let grid = CellGrid::from_mesh(&mesh, config.spacing_tolerance)?;

    info!("Grid: nx={}, ny={}", grid.nx_cell(), grid.ny_cell());
    info!("dx={}, dy={}", grid.dx, grid.dy);

    let mut samples = Vec::with_capacity(config.reynolds.len());
    for &re in &config.reynolds {
        let shear = process_case(config, &grid, re)?;
        samples.push(ForceSample { re, fe: shear.fe });
    }

    write_summary_plot(config, &samples)?;

    info!("Done.");
    Ok(samples)
}

/// Loads one velocity file, computes the lid shear and writes its table and plot.
pub fn process_case(config: &AnalysisConfig, grid: &CellGrid, re: u32) -> PostResult<WallShear> {
    info!("Processing Re = {re}");

    let u_cell = shear::load_u_cell(&config.velocity_file(re), grid)?;
    let shear = WallShear::from_velocity(re, &u_cell, grid);

    info!("  Fe = {:.6}", shear.fe);

    let table = config.shear_table_file(re);
    io::write_columns(
        &table,
        "x  du/dy_at_top_wall",
        &[shear.x_cell.view(), shear.dudy_top.view()],
    )?;
    debug!("wrote {}", table.display());

    let plot = config.shear_plot_file(re);
    Figure::new(8.0, 5.0, config.dpi)
        .title(format!("Shear stress distribution at top wall (Re={re})"))
        .labels("x position", "du/dy at top wall")
        .legend()
        .add(Series::line(shear.x_cell.to_vec(), shear.dudy_top.to_vec(), BLUE).with_label(format!("Re={re}")))
        .save(&plot)?;
    info!("  saved {}", plot.display());

    Ok(shear)
}

pub fn write_summary_plot(config: &AnalysisConfig, samples: &[ForceSample]) -> PostResult<()> {
    let re: Vec<f64> = samples.iter().map(|s| s.re as f64).collect();
    let fe: Vec<f64> = samples.iter().map(|s| s.fe).collect();

    let path = config.summary_plot_file();
    Figure::new(6.0, 4.0, config.dpi)
        .title("Fe vs Reynolds number")
        .labels("Reynolds number (Re)", "Nondimensional force Fe")
        .add(Series::line(re, fe, TAB_BLUE).with_markers())
        .save(&path)?;
    info!("saved {}", path.display());

    Ok(())
}
