use serde::{Deserialize, Serialize};

/// Corrector counts and flags for one PIMPLE time step.
///
/// Field defaults follow the solution-dictionary defaults of the solver
/// this controller drives: one outer and one inner corrector, no
/// non-orthogonal correction, momentum predictor on, subsonic flux
/// formulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PimpleControls {
    pub n_outer_correctors: usize,
    pub n_correctors: usize,
    pub n_non_orth_correctors: usize,
    pub momentum_predictor: bool,
    pub transonic: bool,
    /// Lower bound applied to the pressure field after every inner
    /// corrector.
    pub p_min: f64,
    pub relax: RelaxationFactors,
}

impl Default for PimpleControls {
    fn default() -> Self {
        Self {
            n_outer_correctors: 1,
            n_correctors: 1,
            n_non_orth_correctors: 0,
            momentum_predictor: true,
            transonic: false,
            p_min: 100.0,
            relax: RelaxationFactors::default(),
        }
    }
}

impl PimpleControls {
    pub fn from_json(text: &str) -> Result<Self, String> {
        let controls: Self = serde_json::from_str(text)
            .map_err(|e| format!("invalid PIMPLE controls: {}", e))?;
        controls.validate()?;
        Ok(controls)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.n_outer_correctors == 0 {
            return Err("nOuterCorrectors must be at least 1".to_string());
        }
        if self.n_correctors == 0 {
            return Err("nCorrectors must be at least 1".to_string());
        }
        if !(self.p_min.is_finite() && self.p_min > 0.0) {
            return Err(format!("pMin must be positive, got {}", self.p_min));
        }
        self.relax.validate()
    }
}

/// Under-relaxation factors. `u` and `h` relax the assembled equations,
/// `p` and `rho` blend the fields against their previous iterate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelaxationFactors {
    pub u: f64,
    pub p: f64,
    pub rho: f64,
    pub h: f64,
}

impl Default for RelaxationFactors {
    fn default() -> Self {
        Self {
            u: 0.7,
            p: 0.3,
            rho: 1.0,
            h: 0.7,
        }
    }
}

impl RelaxationFactors {
    pub fn validate(&self) -> Result<(), String> {
        for (name, factor) in [
            ("U", self.u),
            ("p", self.p),
            ("rho", self.rho),
            ("h", self.h),
        ] {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(format!(
                    "relaxation factor for {} must be in (0, 1], got {}",
                    name, factor
                ));
            }
        }
        Ok(())
    }
}

/// Time-step adjustment controls read once per step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeControls {
    pub adjust_time_step: bool,
    pub max_co: f64,
    pub max_delta_t: f64,
}

impl Default for TimeControls {
    fn default() -> Self {
        Self {
            adjust_time_step: false,
            max_co: 0.5,
            max_delta_t: f64::MAX,
        }
    }
}
