pub mod context;
pub mod controls;
pub mod fields;
pub mod kernels;
pub mod pimple;
pub mod report;

pub use context::SimulationContext;
pub use controls::{PimpleControls, RelaxationFactors, TimeControls};
pub use pimple::PimpleSolver;
pub use report::StepReport;
