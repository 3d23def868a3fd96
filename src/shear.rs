use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView1};

use crate::error::{PostError, PostResult};
use crate::io;
use crate::mesh::CellGrid;

// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Wall Shear Result
// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// The top-wall shear distribution and its integral for a single Reynolds number.
#[derive(Debug, Clone)]
pub struct WallShear {
    pub re: u32,
    pub x_cell: Array1<f64>,
    pub dudy_top: Array1<f64>,
    pub fe: f64,
}

impl WallShear {
    /// This function computes du/dy over the whole cell grid, keeps the row nearest the lid and integrates it along x.
    pub fn from_velocity(re: u32, u_cell: &Array2<f64>, grid: &CellGrid) -> WallShear {
        let dudy = wall_normal_gradient(u_cell, grid.dy);

        // The last row is the one next to the lid
        let dudy_top = dudy.row(dudy.nrows() - 1).to_owned();
        let fe = trapezoid(dudy_top.view(), grid.x_cell.view());

        WallShear {
            re,
            x_cell: grid.x_cell.clone(),
            dudy_top,
            fe,
        }
    }
}

// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Load the Velocity Field
// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Loads the u-component (first column) of a velocity file and reshapes it onto the cell grid as (ny_cell, nx_cell).
/// The rows are expected y-major, x-minor with exactly one row per cell.
pub fn load_u_cell(file_path: &Path, grid: &CellGrid) -> PostResult<Array2<f64>> {
    let vel = io::read_columns(file_path, 1)?;

    let expected = grid.n_cells();
    if vel.nrows() != expected {
        return Err(PostError::CellCountMismatch {
            path: file_path.display().to_string(),
            expected,
            found: vel.nrows(),
        });
    }

    // Grab the u column
    let u = vel.column(0).to_vec();

    Array2::from_shape_vec((grid.ny_cell(), grid.nx_cell()), u).map_err(|_| PostError::CellCountMismatch {
        path: file_path.display().to_string(),
        expected,
        found: vel.nrows(),
    })
}

// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Finite Differences and Integration
// ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// A function to calculate du/dy for a (ny, nx) cell field. Every row but the last uses a forward difference to the row
/// above, the last row uses a backward difference to the row below. Both use the cell-to-cell spacing dy.
/// The field needs at least two rows.
pub fn wall_normal_gradient(u_cell: &Array2<f64>, dy: f64) -> Array2<f64> {
    let ny = u_cell.nrows();
    let mut dudy = Array2::<f64>::zeros(u_cell.dim());

    let forward = (&u_cell.slice(s![1.., ..]) - &u_cell.slice(s![..-1, ..])) / dy;
    dudy.slice_mut(s![..-1, ..]).assign(&forward);

    // Backward difference at the lid: (U[-1] - U[-2]) / dy
    dudy.row_mut(ny - 1).assign(&forward.row(ny - 2));

    dudy
}

/// Trapezoidal integral of y over the (possibly non-uniform) abscissa x. Fewer than two samples integrate to zero.
pub fn trapezoid(y: ArrayView1<f64>, x: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(y.len(), x.len());

    let n = y.len().min(x.len());
    (1..n)
        .map(|i| (x[i] - x[i - 1]) * (y[i] + y[i - 1]) / 2.0)
        .sum()
}
