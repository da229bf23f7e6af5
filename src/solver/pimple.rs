use std::time::Instant;

use crate::solver::context::SimulationContext;
use crate::solver::controls::{PimpleControls, TimeControls};
use crate::solver::fields::FieldSet;
use crate::solver::kernels::{ContinuityErrors, FlowKernels, SolveStats, SolverSelection};
use crate::solver::report::StepReport;

/// Drives one compressible PIMPLE time step to self-consistency between
/// momentum, energy and continuity.
///
/// The solver owns no numerics: every assembly, solve and property update
/// goes through the [`FlowKernels`] capability interface. What it does own
/// is the corrector control flow: how often the momentum equation is
/// rebuilt, how many pressure sub-iterations run, when fields are
/// under-relaxed and when the strict final linear-solver configuration is
/// selected.
pub struct PimpleSolver<K: FlowKernels> {
    pub kernels: K,
    pub fields: FieldSet,
    pub controls: PimpleControls,
    pub time_controls: TimeControls,
    cumulative_cont_err: f64,
}

struct InnerOutcome {
    errors: ContinuityErrors,
    rho_min: f64,
    rho_max: f64,
    bounded: usize,
}

impl<K: FlowKernels> PimpleSolver<K> {
    pub fn new(kernels: K, fields: FieldSet) -> Self {
        Self {
            kernels,
            fields,
            controls: PimpleControls::default(),
            time_controls: TimeControls::default(),
            cumulative_cont_err: 0.0,
        }
    }

    /// Mass-conservation drift accumulated since the start of the run.
    pub fn cumulative_continuity_error(&self) -> f64 {
        self.cumulative_cont_err
    }

    /// Advances the solution by one time step.
    pub fn advance(&mut self, ctx: &mut SimulationContext) -> Result<StepReport, String> {
        let started = Instant::now();
        self.controls.validate()?;

        let courant = self.kernels.courant_number(&self.fields, ctx.delta_t());
        log::info!(
            "Courant Number mean: {} max: {}",
            courant.mean,
            courant.max
        );
        ctx.adjust_delta_t(courant.max, &self.time_controls);
        ctx.increment();
        log::info!("Time = {}", ctx.time());

        let n_outer = self.controls.n_outer_correctors;
        if n_outer != 1 {
            // Later correctors blend against these snapshots.
            self.fields.p.store_prev_iter();
            self.fields.rho.store_prev_iter();
        }

        self.kernels.continuity_update(&mut self.fields, ctx.delta_t());

        let mut residuals = Vec::new();
        let mut bounded_total = 0;
        let mut last_inner = None;

        for o_corr in 0..n_outer {
            let final_outer = o_corr + 1 == n_outer;

            let mut u_eqn = Some(self.momentum_corrector(final_outer, ctx.delta_t(), &mut residuals));
            self.energy_corrector(final_outer, ctx.delta_t(), &mut residuals);

            for corr in 0..self.controls.n_correctors {
                let final_corr = corr + 1 == self.controls.n_correctors;
                let outcome = self.pressure_corrector(
                    &mut u_eqn,
                    final_outer,
                    final_corr,
                    ctx.delta_t(),
                    &mut residuals,
                )?;
                bounded_total += outcome.bounded;
                last_inner = Some(outcome);
            }
            // Nothing reuses the assembled momentum coefficients past the
            // inner loop.
            drop(u_eqn);

            self.kernels.correct_turbulence(&self.fields);
        }

        let inner = last_inner.ok_or_else(|| "no pressure corrector ran".to_string())?;
        let wall = started.elapsed();
        log::info!("ExecutionTime = {} s", wall.as_secs_f64());

        Ok(StepReport {
            time: ctx.time(),
            delta_t: ctx.delta_t(),
            courant_max: courant.max,
            courant_mean: courant.mean,
            residuals,
            cont_err_local: inner.errors.local,
            cont_err_global: inner.errors.global,
            cont_err_cumulative: self.cumulative_cont_err,
            rho_min: inner.rho_min,
            rho_max: inner.rho_max,
            bounded_pressure_cells: bounded_total,
            wall_time_ms: (wall.as_secs_f64() * 1000.0) as f32,
        })
    }

    fn momentum_corrector(
        &mut self,
        final_outer: bool,
        dt: f64,
        residuals: &mut Vec<(String, f64)>,
    ) -> K::MomentumEqn {
        let mut eqn = self.kernels.assemble_momentum(&self.fields, dt);

        // Full relaxation only on the final outer pass.
        let factor = if final_outer { 1.0 } else { self.controls.relax.u };
        self.kernels.relax_momentum(&mut eqn, factor);

        self.kernels.add_coriolis(&self.fields, &mut eqn);
        self.kernels.add_porous_resistance(&mut eqn);

        if self.controls.momentum_predictor {
            let selection = if final_outer {
                SolverSelection::Final
            } else {
                SolverSelection::Default
            };
            let stats = self.kernels.solve_momentum(&mut eqn, &mut self.fields, selection);
            record_solve("U", stats, residuals);
        } else {
            // U = rUA * (H - grad p): predicted velocity straight from the
            // assembled coefficients, no direct solve.
            let r_diag = self.kernels.momentum_reciprocal_diag(&eqn);
            let h_op = self.kernels.momentum_h(&eqn);
            let grad_p = self.kernels.gradient(&self.fields.p.field);
            self.fields.u.assign_scaled_difference(&r_diag, &h_op, &grad_p);
            self.kernels.correct_boundary_velocity(&mut self.fields.u);
        }

        eqn
    }

    fn energy_corrector(
        &mut self,
        final_outer: bool,
        dt: f64,
        residuals: &mut Vec<(String, f64)>,
    ) {
        let mut eqn = self.kernels.assemble_energy(&self.fields, dt);
        self.kernels.relax_energy(&mut eqn, self.controls.relax.h);
        let selection = if final_outer {
            SolverSelection::Final
        } else {
            SolverSelection::Default
        };
        let stats = self.kernels.solve_energy(&mut eqn, &mut self.fields, selection);
        record_solve("h", stats, residuals);
        self.kernels.update_thermo(&mut self.fields);
    }

    fn pressure_corrector(
        &mut self,
        u_eqn: &mut Option<K::MomentumEqn>,
        final_outer: bool,
        final_corr: bool,
        dt: f64,
        residuals: &mut Vec<(String, f64)>,
    ) -> Result<InnerOutcome, String> {
        let rho_new = self.kernels.thermo_density(&self.fields);
        self.fields.rho.assign(rho_new);

        let (r_diag, h_op) = {
            let eqn = u_eqn
                .as_ref()
                .ok_or_else(|| "momentum equation released before pressure corrector".to_string())?;
            (
                self.kernels.momentum_reciprocal_diag(eqn),
                self.kernels.momentum_h(eqn),
            )
        };
        self.fields.u.assign_scaled(&r_diag, &h_op);

        if self.controls.n_correctors <= 1 {
            // Single corrector: release the assembled state now, nothing
            // else reads the coefficients.
            *u_eqn = None;
        }

        let n_non_orth = self.controls.n_non_orth_correctors;

        if self.controls.transonic {
            let psi_face = self.kernels.interpolate(&self.fields.psi);
            let mut phid = self.kernels.transonic_flux(&r_diag, &self.fields);
            self.kernels.relative_flux(&psi_face, &mut phid);

            for non_orth in 0..=n_non_orth {
                let final_non_orth = non_orth == n_non_orth;
                let mut p_eqn =
                    self.kernels
                        .assemble_pressure_transonic(&self.fields, &phid, &r_diag, dt);
                let selection = if final_outer && final_corr && final_non_orth {
                    SolverSelection::Final
                } else {
                    SolverSelection::Default
                };
                let stats = self.kernels.solve_pressure(&mut p_eqn, &mut self.fields, selection);
                record_solve("p", stats, residuals);

                if final_non_orth {
                    self.fields.phi = self.kernels.pressure_flux(&p_eqn);
                }
            }
        } else {
            let rho_face = self.kernels.interpolate(&self.fields.rho.field);
            let phi_new = self.kernels.mass_flux(&self.fields);
            self.fields.phi = phi_new;
            self.kernels.relative_flux(&rho_face, &mut self.fields.phi);

            for non_orth in 0..=n_non_orth {
                let final_non_orth = non_orth == n_non_orth;
                let mut p_eqn = self.kernels.assemble_pressure(&self.fields, &r_diag, dt);
                let selection = if final_outer && final_corr && final_non_orth {
                    SolverSelection::Final
                } else {
                    SolverSelection::Default
                };
                let stats = self.kernels.solve_pressure(&mut p_eqn, &mut self.fields, selection);
                record_solve("p", stats, residuals);

                if final_non_orth {
                    let corr_flux = self.kernels.pressure_flux(&p_eqn);
                    self.fields.phi.add_assign(&corr_flux);
                }
            }
        }

        self.kernels.continuity_update(&mut self.fields, dt);

        let errors = self.kernels.continuity_errors(&self.fields);
        self.cumulative_cont_err += errors.global;
        log::info!(
            "time step continuity errors : sum local = {}, global = {}, cumulative = {}",
            errors.local,
            errors.global,
            self.cumulative_cont_err
        );

        // Explicitly relax pressure for the next momentum corrector.
        self.fields.p.relax(self.controls.relax.p);

        let rho_new = self.kernels.thermo_density(&self.fields);
        self.fields.rho.assign(rho_new);
        self.fields.rho.relax(self.controls.relax.rho);

        let (rho_min, rho_max) = self.fields.rho.field.min_max();
        log::info!("rho max/min : {} {}", rho_max, rho_min);

        let grad_p = self.kernels.gradient(&self.fields.p.field);
        self.fields.u.sub_scaled(&r_diag, &grad_p);
        self.kernels.correct_boundary_velocity(&mut self.fields.u);

        self.fields.dp_dt = self.kernels.pressure_work(&self.fields);

        let bounded = self.fields.p.field.bound_min(self.controls.p_min);
        if bounded > 0 {
            log::warn!(
                "pressure bounded to {} in {} cells",
                self.controls.p_min,
                bounded
            );
        }

        Ok(InnerOutcome {
            errors,
            rho_min,
            rho_max,
            bounded,
        })
    }
}

fn record_solve(name: &str, stats: SolveStats, residuals: &mut Vec<(String, f64)>) {
    if !stats.converged {
        log::warn!(
            "{} solve did not converge: initial residual {}, final residual {}, {} iterations",
            name,
            stats.initial_residual,
            stats.final_residual,
            stats.iterations
        );
    }
    residuals.push((name.to_string(), stats.initial_residual));
}
