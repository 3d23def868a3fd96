use std::path::{Path, PathBuf};

/// Inputs, outputs and tolerances for one post-processing run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Reynolds numbers to process, in order
    pub reynolds: Vec<u32>,
    /// Directory holding the `U_Re<Re>.txt` velocity files
    pub velocity_dir: PathBuf,
    /// Node coordinate file, shared by every case
    pub mesh_file: PathBuf,
    pub output_dir: PathBuf,
    /// Allowed relative deviation of any y cell interval from the sampled `dy`
    pub spacing_tolerance: f64,
    /// Pixels per inch for the saved plots
    pub dpi: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            reynolds: vec![10, 100, 300, 500],
            velocity_dir: PathBuf::from("../simple_data"),
            mesh_file: PathBuf::from("../cavity_Re10_xyz.txt"),
            output_dir: PathBuf::from("output"),
            spacing_tolerance: 1e-3,
            dpi: 150,
        }
    }
}

impl AnalysisConfig {
    pub fn velocity_file(&self, re: u32) -> PathBuf {
        self.velocity_dir.join(format!("U_Re{re}.txt"))
    }

    pub fn shear_table_file(&self, re: u32) -> PathBuf {
        self.output_dir.join(format!("du_dy_top_Re{re}.txt"))
    }

    pub fn shear_plot_file(&self, re: u32) -> PathBuf {
        self.output_dir.join(format!("du_dy_top_Re{re}.png"))
    }

    pub fn summary_plot_file(&self) -> PathBuf {
        self.output_dir.join("Fe_vs_Re.png")
    }

    /// A configuration rooted at `dir`: velocity files and the mesh file
    /// are looked up inside it and outputs land in `dir/output`.
    pub fn rooted_at(dir: &Path, mesh_file: &str, reynolds: Vec<u32>) -> Self {
        Self {
            reynolds,
            velocity_dir: dir.to_path_buf(),
            mesh_file: dir.join(mesh_file),
            output_dir: dir.join("output"),
            ..Self::default()
        }
    }
}
