use crate::solver::fields::{FaceField, FieldSet, ScalarField, VectorField};

/// Selects the per-equation linear-solver configuration: the default one,
/// or the tightly-converged variant used on the last corrector pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverSelection {
    #[default]
    Default,
    Final,
}

impl SolverSelection {
    pub fn is_final(self) -> bool {
        matches!(self, SolverSelection::Final)
    }

    /// Configuration key for a given equation name, e.g. `pFinal` for the
    /// strict pressure solve.
    pub fn key(self, field: &str) -> String {
        match self {
            SolverSelection::Default => field.to_string(),
            SolverSelection::Final => format!("{}Final", field),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SolveStats {
    pub iterations: u32,
    pub initial_residual: f64,
    pub final_residual: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuityErrors {
    pub local: f64,
    pub global: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CourantNumber {
    pub max: f64,
    pub mean: f64,
}

/// Capability interface onto the native CFD library.
///
/// Everything numerical lives behind this trait: discretization, equation
/// assembly, linear solves, boundary conditions, thermophysics and
/// turbulence. The iteration controller only sequences these calls; an
/// implementation binds them to whichever library it targets.
///
/// Equation objects are ephemeral assembled systems. They are created per
/// call and consumed by the matching solve; the momentum equation alone is
/// kept alive across the inner pressure loop so its diagonal and H
/// contributions can be reused, and dropping it releases the assembled
/// state.
pub trait FlowKernels {
    type MomentumEqn;
    type EnergyEqn;
    type PressureEqn;

    // Momentum: transient advection-diffusion for U with porous ddt,
    // turbulent stress divergence, Coriolis and resistance sources.
    fn assemble_momentum(&mut self, fields: &FieldSet, dt: f64) -> Self::MomentumEqn;
    fn relax_momentum(&mut self, eqn: &mut Self::MomentumEqn, factor: f64);
    fn add_coriolis(&mut self, fields: &FieldSet, eqn: &mut Self::MomentumEqn);
    fn add_porous_resistance(&mut self, eqn: &mut Self::MomentumEqn);
    /// Solves the momentum equation against the current pressure gradient,
    /// updating the velocity field in place.
    fn solve_momentum(
        &mut self,
        eqn: &mut Self::MomentumEqn,
        fields: &mut FieldSet,
        selection: SolverSelection,
    ) -> SolveStats;
    /// Reciprocal of the assembled diagonal, 1/A.
    fn momentum_reciprocal_diag(&self, eqn: &Self::MomentumEqn) -> ScalarField;
    /// Off-diagonal plus source contributions, H.
    fn momentum_h(&self, eqn: &Self::MomentumEqn) -> VectorField;

    // Energy: transient advection-diffusion for h with the pressure-work
    // source term.
    fn assemble_energy(&mut self, fields: &FieldSet, dt: f64) -> Self::EnergyEqn;
    fn relax_energy(&mut self, eqn: &mut Self::EnergyEqn, factor: f64);
    fn solve_energy(
        &mut self,
        eqn: &mut Self::EnergyEqn,
        fields: &mut FieldSet,
        selection: SolverSelection,
    ) -> SolveStats;

    // Pressure correction.
    /// Face mass flux from interpolated density and velocity dotted with
    /// the face-area vectors.
    fn mass_flux(&self, fields: &FieldSet) -> FaceField;
    /// Compressible flux-correction field: interpolated psi times the face
    /// velocity flux plus the flux time-derivative correction.
    fn transonic_flux(&self, r_diag: &ScalarField, fields: &FieldSet) -> FaceField;
    fn interpolate(&self, field: &ScalarField) -> FaceField;
    /// Subtracts the rotating-frame contribution from `flux`, weighted by
    /// the face-interpolated density-like factor.
    fn relative_flux(&mut self, face_weight: &FaceField, flux: &mut FaceField);
    /// Pressure equation with an explicit divergence of the current flux.
    fn assemble_pressure(
        &mut self,
        fields: &FieldSet,
        r_diag: &ScalarField,
        dt: f64,
    ) -> Self::PressureEqn;
    /// Pressure equation with the implicit compressible convective term.
    fn assemble_pressure_transonic(
        &mut self,
        fields: &FieldSet,
        phid: &FaceField,
        r_diag: &ScalarField,
        dt: f64,
    ) -> Self::PressureEqn;
    fn solve_pressure(
        &mut self,
        eqn: &mut Self::PressureEqn,
        fields: &mut FieldSet,
        selection: SolverSelection,
    ) -> SolveStats;
    /// Face flux consistent with the solved pressure equation.
    fn pressure_flux(&self, eqn: &Self::PressureEqn) -> FaceField;

    // Shared operators.
    fn gradient(&self, field: &ScalarField) -> VectorField;
    fn correct_boundary_velocity(&mut self, u: &mut VectorField);
    /// Pressure-work transport term DpDt for the next energy solve.
    fn pressure_work(&self, fields: &FieldSet) -> ScalarField;

    /// Advances the density field through the continuity equation using
    /// the current flux.
    fn continuity_update(&mut self, fields: &mut FieldSet, dt: f64);
    fn continuity_errors(&self, fields: &FieldSet) -> ContinuityErrors;
    fn courant_number(&self, fields: &FieldSet, dt: f64) -> CourantNumber;

    // Thermophysical and turbulence closure.
    /// Recomputes derived thermophysical properties from the current
    /// enthalpy/pressure state.
    fn update_thermo(&mut self, fields: &mut FieldSet);
    fn thermo_density(&self, fields: &FieldSet) -> ScalarField;
    fn correct_turbulence(&mut self, fields: &FieldSet);
}
