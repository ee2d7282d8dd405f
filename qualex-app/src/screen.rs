//! Participant-facing text for each phase.

use std::io::{self, Write};

use qualex_core::{IdentitySource, ResponseSink, SurveyPhase};
use qualex_experiment::{ExperimentStateMachine, Notice, TransitionError};
use qualex_timing::Clock;
use rand::Rng;

pub const TITLE: &str = "Subjective Quality Assessment of Gaussian Splats vs Point Clouds";
const CHOICES: &str = "[l] left looks better   [r] right looks better";

pub fn render<I, K, C, R, W>(
    experiment: &ExperimentStateMachine<I, K, C, R>,
    out: &mut W,
) -> io::Result<()>
where
    I: IdentitySource,
    K: ResponseSink,
    C: Clock,
    R: Rng,
    W: Write,
{
    match experiment.current_phase() {
        SurveyPhase::Intro => {
            writeln!(out, "\n== {TITLE} ==")?;
            writeln!(
                out,
                "You will watch videos of two side-by-side 3D reconstructions and pick \
                 the one with better visual quality. A short training comes first."
            )?;
            writeln!(out, "[n] Next")?;
        }
        SurveyPhase::TrainingIntro => {
            writeln!(out, "\n== Start of Training ==")?;
            writeln!(
                out,
                "Choose the reconstruction with the best visual quality. In the \
                 experiment, a choice submits your answer and moves to the next video."
            )?;
            writeln!(out, "[n] Next")?;
        }
        SurveyPhase::TrainingStimulus => {
            match experiment.current_stimulus() {
                Ok(Some(stimulus)) => writeln!(out, "\nTraining video: {}", stimulus.source)?,
                _ => writeln!(out, "\nTraining video")?,
            }
            writeln!(out, "{CHOICES}")?;
        }
        SurveyPhase::TrainingComplete => {
            writeln!(out, "\n== Training Completed ==")?;
            writeln!(out, "You can now begin the experiment.")?;
            writeln!(out, "[n] Start")?;
        }
        SurveyPhase::Trial(question) => {
            let total = experiment.progress().map_or(question, |(_, n)| n);
            writeln!(out, "\nQuestion {question}/{total}")?;
            match experiment.current_stimulus() {
                Ok(Some(stimulus)) => {
                    writeln!(out, "Video: {}", stimulus.source)?;
                    writeln!(out, "{CHOICES}")?;
                }
                Ok(None) | Err(_) => {
                    writeln!(out, "No video found for question {question}.")?;
                    writeln!(out, "Please contact the administrator. [q] quit")?;
                }
            }
        }
        SurveyPhase::Completed => {}
    }
    Ok(())
}

pub fn notice<W: Write>(notice: &Notice, out: &mut W) -> io::Result<()> {
    match notice {
        // Operator-only; logged by the state machine.
        Notice::FallbackParticipantId { .. } => Ok(()),
        Notice::ResponsesSaved { .. } => writeln!(
            out,
            "\nSurvey completed! Thank you for taking part and contributing to this research study."
        ),
        Notice::ResponsesNotSaved { .. } => writeln!(
            out,
            "\nSurvey completed! However, there was an issue saving responses. \
             Please contact the administrator."
        ),
    }
}

pub fn rejection<W: Write>(error: &TransitionError, out: &mut W) -> io::Result<()> {
    match error {
        TransitionError::NotAccepted { phase, .. } if phase.accepts_proceed() => {
            writeln!(out, "Press [n] to continue.")
        }
        TransitionError::NotAccepted { .. } => writeln!(out, "Choose [l] or [r]."),
        TransitionError::MissingStimulus { question, .. } => writeln!(
            out,
            "No video found for question {question}; your answer was not recorded."
        ),
        TransitionError::IncompleteAnswers { answered, expected } => writeln!(
            out,
            "Only {answered} of {expected} questions have answers; the survey cannot be submitted."
        ),
    }
}
