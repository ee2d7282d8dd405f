use std::fmt;

use serde::{Deserialize, Serialize};

/// Screens a participant moves through, in order.
///
/// `Trial` carries the 1-based question number.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyPhase {
    Intro,
    TrainingIntro,
    TrainingStimulus,
    TrainingComplete,
    Trial(u32),
    Completed,
}

impl Default for SurveyPhase {
    fn default() -> Self {
        SurveyPhase::Intro
    }
}

impl SurveyPhase {
    /// Phases left with an explicit "proceed" action.
    pub fn accepts_proceed(&self) -> bool {
        matches!(
            self,
            Self::Intro | Self::TrainingIntro | Self::TrainingComplete
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn question(&self) -> Option<u32> {
        match self {
            Self::Trial(q) => Some(*q),
            _ => None,
        }
    }

    /// The phase reached from this one by the action it accepts, for a
    /// survey of `num_questions` graded trials.
    pub fn next(&self, num_questions: u32) -> Option<Self> {
        use SurveyPhase::*;
        Some(match self {
            Intro => TrainingIntro,
            TrainingIntro => TrainingStimulus,
            TrainingStimulus => TrainingComplete,
            TrainingComplete if num_questions == 0 => Completed,
            TrainingComplete => Trial(1),
            Trial(q) if *q < num_questions => Trial(q + 1),
            Trial(_) => Completed,
            Completed => return None,
        })
    }
}

impl fmt::Display for SurveyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intro => f.write_str("intro"),
            Self::TrainingIntro => f.write_str("training-intro"),
            Self::TrainingStimulus => f.write_str("training-stimulus"),
            Self::TrainingComplete => f.write_str("training-complete"),
            Self::Trial(q) => write!(f, "trial-{q}"),
            Self::Completed => f.write_str("completed"),
        }
    }
}
