use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView1};
use tracing::debug;

use crate::error::{PostError, PostResult};
use crate::io;

/// The distinct node coordinates of a structured, axis-aligned mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
}

impl Mesh {
    /// This function loads the mesh from a node file given a file path. The first two columns are x and y,
    /// any further columns are ignored and the row order does not matter.
    pub fn load(file_path: &Path) -> PostResult<Mesh> {
        let nodes = io::read_columns(file_path, 2)?;
        debug!("read {} mesh nodes from {}", nodes.nrows(), file_path.display());
        Ok(Mesh::from_nodes(&nodes))
    }

    /// Builds the mesh from an (n_nodes, >=2) array of node coordinates.
    pub fn from_nodes(nodes: &Array2<f64>) -> Mesh {
        Mesh {
            x: unique_sorted(nodes.column(0)),
            y: unique_sorted(nodes.column(1)),
        }
    }

    pub fn nx(&self) -> usize {
        self.x.len()
    }

    pub fn ny(&self) -> usize {
        self.y.len()
    }
}

/// The cell-centered grid between the mesh nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    pub x_cell: Array1<f64>,
    pub y_cell: Array1<f64>,
    pub dx: f64,
    pub dy: f64,
}

impl CellGrid {
    /// This function builds the cell centers as midpoints of consecutive node coordinates. The spacings dx and dy
    /// are sampled from the first pair of cell centers. The y spacing feeds every wall-normal difference, so each y
    /// interval has to agree with dy to within `tolerance` (relative).
    pub fn from_mesh(mesh: &Mesh, tolerance: f64) -> PostResult<CellGrid> {
        for (axis, coords) in [("x", &mesh.x), ("y", &mesh.y)] {
            if coords.len() < 3 {
                return Err(PostError::InsufficientNodes {
                    axis,
                    found: coords.len(),
                });
            }
        }

        let x_cell = midpoints(mesh.x.view());
        let y_cell = midpoints(mesh.y.view());

        let dx = x_cell[1] - x_cell[0];
        let dy = y_cell[1] - y_cell[0];

        check_uniform("y", y_cell.view(), dy, tolerance)?;

        Ok(CellGrid { x_cell, y_cell, dx, dy })
    }

    pub fn nx_cell(&self) -> usize {
        self.x_cell.len()
    }

    pub fn ny_cell(&self) -> usize {
        self.y_cell.len()
    }

    pub fn n_cells(&self) -> usize {
        self.nx_cell() * self.ny_cell()
    }
}

fn unique_sorted(values: ArrayView1<f64>) -> Array1<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v.dedup();
    Array1::from(v)
}

fn midpoints(coords: ArrayView1<f64>) -> Array1<f64> {
    (&coords.slice(s![..-1]) + &coords.slice(s![1..])) / 2.0
}

fn check_uniform(axis: &'static str, centers: ArrayView1<f64>, expected: f64, tolerance: f64) -> PostResult<()> {
    for (index, pair) in centers.windows(2).into_iter().enumerate() {
        let found = pair[1] - pair[0];
        if (found - expected).abs() > tolerance * expected.abs() {
            return Err(PostError::NonUniformSpacing {
                axis,
                index,
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Nodes of a uniform nx by ny mesh listed in a scrambled order, with a z column.
    fn scrambled_nodes(nx: usize, ny: usize, h: f64) -> Array2<f64> {
        let mut rows = Vec::new();
        for j in (0..ny).rev() {
            for i in 0..nx {
                rows.extend([i as f64 * h, j as f64 * h, 0.0]);
            }
        }
        Array2::from_shape_vec((nx * ny, 3), rows).unwrap()
    }

    #[test]
    fn test_unique_axes_from_nodes() {
        let mesh = Mesh::from_nodes(&scrambled_nodes(4, 3, 0.5));
        assert_eq!(mesh.x, array![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(mesh.y, array![0.0, 0.5, 1.0]);
        assert_eq!((mesh.nx(), mesh.ny()), (4, 3));
    }

    #[test]
    fn test_cell_grid_counts_and_midpoints() {
        let mesh = Mesh::from_nodes(&scrambled_nodes(5, 4, 0.25));
        let grid = CellGrid::from_mesh(&mesh, 1e-9).unwrap();

        assert_eq!(grid.nx_cell(), mesh.nx() - 1);
        assert_eq!(grid.ny_cell(), mesh.ny() - 1);
        assert_eq!(grid.n_cells(), 12);
        for i in 0..grid.nx_cell() {
            assert_relative_eq!(grid.x_cell[i], 0.5 * (mesh.x[i] + mesh.x[i + 1]));
        }
        for j in 0..grid.ny_cell() {
            assert_relative_eq!(grid.y_cell[j], 0.5 * (mesh.y[j] + mesh.y[j + 1]));
        }
        assert_relative_eq!(grid.dx, 0.25);
        assert_relative_eq!(grid.dy, 0.25);
    }

    #[test]
    fn test_non_uniform_x_is_allowed() {
        let mesh = Mesh {
            x: array![0.0, 1.0, 3.0, 6.0],
            y: array![0.0, 1.0, 2.0],
        };
        let grid = CellGrid::from_mesh(&mesh, 1e-6).unwrap();
        assert_eq!(grid.x_cell, array![0.5, 2.0, 4.5]);
        assert_relative_eq!(grid.dx, 1.5);
    }

    #[test]
    fn test_non_uniform_y_is_rejected() {
        let mesh = Mesh {
            x: array![0.0, 1.0, 2.0],
            y: array![0.0, 1.0, 2.0, 4.0],
        };
        let err = CellGrid::from_mesh(&mesh, 1e-6).unwrap_err();
        match err {
            PostError::NonUniformSpacing { axis, index, expected, found } => {
                assert_eq!(axis, "y");
                assert_eq!(index, 1);
                assert_relative_eq!(expected, 1.0);
                assert_relative_eq!(found, 1.5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_small_spacing_noise_is_tolerated() {
        let mesh = Mesh {
            x: array![0.0, 0.1, 0.2],
            y: array![0.0, 0.1, 0.2, 0.3000001],
        };
        assert!(CellGrid::from_mesh(&mesh, 1e-3).is_ok());
    }

    #[test]
    fn test_too_few_nodes() {
        let mesh = Mesh {
            x: array![0.0, 1.0],
            y: array![0.0, 1.0, 2.0],
        };
        assert!(matches!(
            CellGrid::from_mesh(&mesh, 1e-6),
            Err(PostError::InsufficientNodes { axis: "x", found: 2 })
        ));
    }

    #[test]
    fn test_load_mesh_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.txt");
        std::fs::write(&path, "0 0\n1 0\n2 0\n0 1\n1 1\n2 1\n0 2\n1 2\n2 2\n").unwrap();

        let mesh = Mesh::load(&path).unwrap();
        assert_eq!(mesh.x, array![0.0, 1.0, 2.0]);
        assert_eq!(mesh.y, array![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_load_mesh_needs_two_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes.txt");
        std::fs::write(&path, "0\n1\n2\n").unwrap();
        assert!(matches!(Mesh::load(&path), Err(PostError::TooFewColumns { .. })));
    }
}
