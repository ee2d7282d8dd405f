pub mod config;
pub mod planner;
pub mod session;
pub mod state;

pub use config::{ConfigError, ExperimentConfig};
pub use planner::{
    BALANCED_LATIN_SQUARE_6, PlanError, balanced_latin_square, latin_rows, plan, plan_seeded,
};
pub use session::{SaveStatus, SessionState};
pub use state::{ExperimentEvent, ExperimentStateMachine, Notice, Step, TransitionError};
