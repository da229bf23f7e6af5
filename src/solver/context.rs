use crate::solver::controls::TimeControls;

const SMALL: f64 = 1.0e-15;

/// Explicit simulation-time value passed into the controller each step.
///
/// Carries the advancing time, the (possibly adaptive) time-step size and
/// the write trigger; the host loop owns it for the duration of a run.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    time: f64,
    delta_t: f64,
    step: u64,
    pub end_time: f64,
    write_interval: f64,
    next_write: f64,
}

impl SimulationContext {
    pub fn new(delta_t: f64, end_time: f64) -> Result<Self, String> {
        if !(delta_t.is_finite() && delta_t > 0.0) {
            return Err(format!("deltaT must be positive, got {}", delta_t));
        }
        Ok(Self {
            time: 0.0,
            delta_t,
            step: 0,
            end_time,
            write_interval: 0.0,
            next_write: f64::MAX,
        })
    }

    pub fn with_write_interval(mut self, interval: f64) -> Self {
        self.write_interval = interval;
        self.next_write = if interval > 0.0 { interval } else { f64::MAX };
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// Run-control condition, evaluated once per time step by the host
    /// loop.
    pub fn running(&self) -> bool {
        self.time + SMALL < self.end_time
    }

    pub fn increment(&mut self) {
        self.time += self.delta_t;
        self.step += 1;
    }

    /// Rescales the time step from the Courant number of the last step.
    ///
    /// Growth is limited to 1.2x per step; when the flow exceeds the
    /// configured Courant limit the step shrinks directly to the
    /// compliant size. Capped by `max_delta_t`. No-op unless adjustment
    /// is enabled.
    pub fn adjust_delta_t(&mut self, co_max: f64, controls: &TimeControls) {
        if !controls.adjust_time_step {
            return;
        }
        let max_fact = controls.max_co / (co_max + SMALL);
        let fact = max_fact.min(1.0 + 0.1 * max_fact).min(1.2);
        self.delta_t = (fact * self.delta_t).min(controls.max_delta_t);
        log::info!("deltaT = {}", self.delta_t);
    }

    /// Write-interval trigger. Returns true at most once per crossed
    /// interval; the checkpoint itself is the host's responsibility.
    pub fn should_write(&mut self) -> bool {
        if self.write_interval <= 0.0 {
            return false;
        }
        if self.time + SMALL >= self.next_write {
            self.next_write += self.write_interval;
            true
        } else {
            false
        }
    }
}
