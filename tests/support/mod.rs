#![allow(dead_code)]

use nalgebra::Vector2;
use rhopimple::solver::fields::{FaceField, FieldSet, ScalarField, VectorField};
use rhopimple::solver::kernels::{
    ContinuityErrors, CourantNumber, FlowKernels, SolveStats, SolverSelection,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    AssembleMomentum,
    RelaxMomentum(f64),
    AddCoriolis,
    AddPorousResistance,
    SolveMomentum(SolverSelection),
    ReleaseMomentum,
    AssembleEnergy,
    RelaxEnergy(f64),
    SolveEnergy(SolverSelection),
    MassFlux,
    TransonicFlux,
    Interpolate,
    RelativeFlux,
    AssemblePressure { transonic: bool },
    SolvePressure(SolverSelection),
    PressureFlux,
    Gradient,
    CorrectBoundaryVelocity,
    PressureWork,
    ContinuityUpdate,
    ContinuityErrorsQuery,
    CourantQuery,
    UpdateThermo,
    ThermoDensity,
    CorrectTurbulence,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Momentum-equation stand-in whose drop marks the release of the
/// retained coefficients.
pub struct MomentumHandle {
    log: EventLog,
}

impl Drop for MomentumHandle {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Event::ReleaseMomentum);
    }
}

/// Recording stand-in for the native library: every capability call is
/// appended to an event log, field outputs are uniform values chosen by
/// the test.
pub struct ScriptedKernels {
    pub log: EventLog,
    pub n_cells: usize,
    pub n_faces: usize,
    pub reciprocal_diag: f64,
    pub h_op: (f64, f64),
    pub grad_p: (f64, f64),
    pub mass_flux_value: f64,
    pub transonic_flux_value: f64,
    pub pressure_flux_value: f64,
    pub density_value: f64,
    /// Written into the pressure field by every pressure solve.
    pub solved_pressure: Option<Vec<f64>>,
    pub cont_err: ContinuityErrors,
    pub courant: CourantNumber,
}

impl ScriptedKernels {
    pub fn new(n_cells: usize, n_faces: usize) -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            n_cells,
            n_faces,
            reciprocal_diag: 2.0,
            h_op: (3.0, 1.0),
            grad_p: (0.5, 0.25),
            mass_flux_value: 5.0,
            transonic_flux_value: 4.0,
            pressure_flux_value: 2.0,
            density_value: 1.1,
            solved_pressure: None,
            cont_err: ContinuityErrors {
                local: 1.0e-8,
                global: 1.0e-9,
            },
            courant: CourantNumber {
                max: 0.4,
                mean: 0.1,
            },
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.borrow().clone()
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }

    fn stats() -> SolveStats {
        SolveStats {
            iterations: 3,
            initial_residual: 1.0e-3,
            final_residual: 1.0e-9,
            converged: true,
        }
    }
}

impl FlowKernels for ScriptedKernels {
    type MomentumEqn = MomentumHandle;
    type EnergyEqn = ();
    type PressureEqn = ();

    fn assemble_momentum(&mut self, _fields: &FieldSet, _dt: f64) -> MomentumHandle {
        self.push(Event::AssembleMomentum);
        MomentumHandle {
            log: self.log.clone(),
        }
    }

    fn relax_momentum(&mut self, _eqn: &mut MomentumHandle, factor: f64) {
        self.push(Event::RelaxMomentum(factor));
    }

    fn add_coriolis(&mut self, _fields: &FieldSet, _eqn: &mut MomentumHandle) {
        self.push(Event::AddCoriolis);
    }

    fn add_porous_resistance(&mut self, _eqn: &mut MomentumHandle) {
        self.push(Event::AddPorousResistance);
    }

    fn solve_momentum(
        &mut self,
        _eqn: &mut MomentumHandle,
        _fields: &mut FieldSet,
        selection: SolverSelection,
    ) -> SolveStats {
        self.push(Event::SolveMomentum(selection));
        Self::stats()
    }

    fn momentum_reciprocal_diag(&self, _eqn: &MomentumHandle) -> ScalarField {
        ScalarField::new(self.n_cells, self.reciprocal_diag)
    }

    fn momentum_h(&self, _eqn: &MomentumHandle) -> VectorField {
        VectorField::new(self.n_cells, Vector2::new(self.h_op.0, self.h_op.1))
    }

    fn assemble_energy(&mut self, _fields: &FieldSet, _dt: f64) {
        self.push(Event::AssembleEnergy);
    }

    fn relax_energy(&mut self, _eqn: &mut (), factor: f64) {
        self.push(Event::RelaxEnergy(factor));
    }

    fn solve_energy(
        &mut self,
        _eqn: &mut (),
        _fields: &mut FieldSet,
        selection: SolverSelection,
    ) -> SolveStats {
        self.push(Event::SolveEnergy(selection));
        Self::stats()
    }

    fn mass_flux(&self, _fields: &FieldSet) -> FaceField {
        self.push(Event::MassFlux);
        FaceField::new(self.n_faces, self.mass_flux_value)
    }

    fn transonic_flux(&self, _r_diag: &ScalarField, _fields: &FieldSet) -> FaceField {
        self.push(Event::TransonicFlux);
        FaceField::new(self.n_faces, self.transonic_flux_value)
    }

    fn interpolate(&self, _field: &ScalarField) -> FaceField {
        self.push(Event::Interpolate);
        FaceField::new(self.n_faces, 1.0)
    }

    fn relative_flux(&mut self, _face_weight: &FaceField, _flux: &mut FaceField) {
        self.push(Event::RelativeFlux);
    }

    fn assemble_pressure(&mut self, _fields: &FieldSet, _r_diag: &ScalarField, _dt: f64) {
        self.push(Event::AssemblePressure { transonic: false });
    }

    fn assemble_pressure_transonic(
        &mut self,
        _fields: &FieldSet,
        _phid: &FaceField,
        _r_diag: &ScalarField,
        _dt: f64,
    ) {
        self.push(Event::AssemblePressure { transonic: true });
    }

    fn solve_pressure(
        &mut self,
        _eqn: &mut (),
        fields: &mut FieldSet,
        selection: SolverSelection,
    ) -> SolveStats {
        self.push(Event::SolvePressure(selection));
        if let Some(p) = &self.solved_pressure {
            fields.p.field.values.copy_from_slice(p);
        }
        Self::stats()
    }

    fn pressure_flux(&self, _eqn: &()) -> FaceField {
        self.push(Event::PressureFlux);
        FaceField::new(self.n_faces, self.pressure_flux_value)
    }

    fn gradient(&self, _field: &ScalarField) -> VectorField {
        self.push(Event::Gradient);
        VectorField::new(self.n_cells, Vector2::new(self.grad_p.0, self.grad_p.1))
    }

    fn correct_boundary_velocity(&mut self, _u: &mut VectorField) {
        self.push(Event::CorrectBoundaryVelocity);
    }

    fn pressure_work(&self, _fields: &FieldSet) -> ScalarField {
        self.push(Event::PressureWork);
        ScalarField::new(self.n_cells, 0.0)
    }

    fn continuity_update(&mut self, _fields: &mut FieldSet, _dt: f64) {
        self.push(Event::ContinuityUpdate);
    }

    fn continuity_errors(&self, _fields: &FieldSet) -> ContinuityErrors {
        self.push(Event::ContinuityErrorsQuery);
        self.cont_err
    }

    fn courant_number(&self, _fields: &FieldSet, _dt: f64) -> CourantNumber {
        self.push(Event::CourantQuery);
        self.courant
    }

    fn update_thermo(&mut self, _fields: &mut FieldSet) {
        self.push(Event::UpdateThermo);
    }

    fn thermo_density(&self, _fields: &FieldSet) -> ScalarField {
        self.push(Event::ThermoDensity);
        ScalarField::new(self.n_cells, self.density_value)
    }

    fn correct_turbulence(&mut self, _fields: &FieldSet) {
        self.push(Event::CorrectTurbulence);
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn indices_where<F: Fn(&Event) -> bool>(events: &[Event], pred: F) -> Vec<usize> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e))
        .map(|(i, _)| i)
        .collect()
}
