pub mod error;
pub mod participant;
pub mod phase;
pub mod sink;
pub mod stimulus;
pub mod trial;

pub use error::StoreError;
pub use participant::{IdentitySource, ParticipantId};
pub use phase::SurveyPhase;
pub use sink::ResponseSink;
pub use stimulus::{SCENE_COUNT, ScenePair, Stimulus, StimulusCatalog, TrialPlan};
pub use trial::{Choice, ResponseRecord, Side, TIMESTAMP_FORMAT, TrialResult};
