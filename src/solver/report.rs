use serde::Serialize;

/// Diagnostics for one completed time step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub time: f64,
    pub delta_t: f64,
    pub courant_max: f64,
    pub courant_mean: f64,
    /// Initial residual per linear solve, in solve order.
    pub residuals: Vec<(String, f64)>,
    pub cont_err_local: f64,
    pub cont_err_global: f64,
    pub cont_err_cumulative: f64,
    pub rho_min: f64,
    pub rho_max: f64,
    /// Cells raised to the pressure floor across all inner correctors.
    pub bounded_pressure_cells: usize,
    pub wall_time_ms: f32,
}
