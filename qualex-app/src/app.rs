use std::io::{BufRead, Write};

use anyhow::Result;
use qualex_core::{IdentitySource, ResponseSink, Side};
use qualex_experiment::{ExperimentEvent, ExperimentStateMachine};
use qualex_timing::Clock;
use rand::Rng;
use tracing::{debug, warn};

use crate::screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed { saved: bool },
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Event(ExperimentEvent),
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Input::Event(ExperimentEvent::Proceed),
        "l" | "left" => Input::Event(ExperimentEvent::Choose(Side::Left)),
        "r" | "right" => Input::Event(ExperimentEvent::Choose(Side::Right)),
        "q" | "quit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

/// Terminal front end: one action per input line.
pub struct App<I, K, C, R>
where
    I: IdentitySource,
    K: ResponseSink,
    C: Clock,
    R: Rng,
{
    experiment: ExperimentStateMachine<I, K, C, R>,
}

impl<I, K, C, R> App<I, K, C, R>
where
    I: IdentitySource,
    K: ResponseSink,
    C: Clock,
    R: Rng,
{
    pub fn new(experiment: ExperimentStateMachine<I, K, C, R>) -> Self {
        Self { experiment }
    }

    pub fn experiment(&self) -> &ExperimentStateMachine<I, K, C, R> {
        &self.experiment
    }

    /// Runs until the session completes or input ends. End of input counts
    /// as abandoning the session, which persists nothing.
    pub fn run<In: BufRead, Out: Write>(
        &mut self,
        input: In,
        out: &mut Out,
    ) -> Result<SessionOutcome> {
        let mut lines = input.lines();
        // Set once the step that completed the session has printed its notices.
        let mut announced = false;
        loop {
            if self.experiment.is_completed() {
                if !announced {
                    let step = self.experiment.handle_event(ExperimentEvent::Redisplay)?;
                    for notice in &step.notices {
                        screen::notice(notice, out)?;
                    }
                }
                out.flush()?;
                let saved = self
                    .experiment
                    .save_status()
                    .is_some_and(|s| s.is_saved());
                return Ok(SessionOutcome::Completed { saved });
            }

            screen::render(&self.experiment, out)?;
            write!(out, "> ")?;
            out.flush()?;

            let Some(line) = lines.next().transpose()? else {
                return Ok(self.abandon());
            };
            match parse_input(&line) {
                Input::Event(event) => match self.experiment.handle_event(event) {
                    Ok(step) => {
                        debug!(from = %step.from, to = %step.to, "step");
                        for notice in &step.notices {
                            screen::notice(notice, out)?;
                        }
                        announced = step.to.is_terminal();
                    }
                    Err(e) => screen::rejection(&e, out)?,
                },
                Input::Quit => return Ok(self.abandon()),
                Input::Unknown(text) => writeln!(out, "Unrecognized input {text:?}.")?,
            }
        }
    }

    fn abandon(&self) -> SessionOutcome {
        warn!(
            phase = %self.experiment.current_phase(),
            answered = self.experiment.session().answered(),
            "session abandoned, nothing saved"
        );
        SessionOutcome::Abandoned
    }
}
