use qualex_core::{
    IdentitySource, ParticipantId, ResponseRecord, ResponseSink, Side, Stimulus,
    StimulusCatalog, SurveyPhase,
};
use qualex_timing::{Clock, seconds_between};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::planner;
use crate::session::{SaveStatus, SessionState};

/// Participant actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentEvent {
    /// "Next" on an intro or completion screen.
    Proceed,
    /// Left/right preference while a stimulus is shown.
    Choose(Side),
    /// The screen is drawn again. Never changes state.
    Redisplay,
}

/// Operator- or participant-visible side effects of a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The identity source failed and a random id was drawn instead.
    FallbackParticipantId { id: ParticipantId, reason: String },
    ResponsesSaved { rows: usize },
    /// Shown to the participant as "responses may not have been saved".
    ResponsesNotSaved { reason: String },
}

/// Result of a handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub from: SurveyPhase,
    pub to: SurveyPhase,
    pub notices: Vec<Notice>,
}

impl Step {
    fn stay(phase: SurveyPhase) -> Self {
        Self {
            from: phase,
            to: phase,
            notices: Vec::new(),
        }
    }

    pub fn advanced(&self) -> bool {
        self.from != self.to
    }
}

/// Rejected events. The session stays in the phase it was in.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("{event:?} is not accepted during {phase}")]
    NotAccepted {
        phase: SurveyPhase,
        event: ExperimentEvent,
    },

    #[error("no stimulus available for question {question} (plan index {index:?})")]
    MissingStimulus { question: u32, index: Option<usize> },

    #[error("only {answered} of {expected} questions answered")]
    IncompleteAnswers { answered: usize, expected: usize },
}

/// Drives one participant from the intro screen to completion.
///
/// All transitions are synchronous. The identity source is asked once, when
/// the graded trials begin, and the response sink is written once, when the
/// last trial is answered.
pub struct ExperimentStateMachine<I, K, C, R>
where
    I: IdentitySource,
    K: ResponseSink,
    C: Clock,
    R: Rng,
{
    config: ExperimentConfig,
    catalog: StimulusCatalog,
    identity: I,
    sink: K,
    clock: C,
    rng: R,
    session: SessionState,
}

impl<I, K, C, R> ExperimentStateMachine<I, K, C, R>
where
    I: IdentitySource,
    K: ResponseSink,
    C: Clock,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, identity: I, sink: K, clock: C, rng: R) -> Self {
        let catalog = config.catalog();
        Self {
            config,
            catalog,
            identity,
            sink,
            clock,
            rng,
            session: SessionState::new(),
        }
    }

    pub fn handle_event(&mut self, event: ExperimentEvent) -> Result<Step, TransitionError> {
        let phase = self.session.phase;
        match (phase, event) {
            (_, ExperimentEvent::Redisplay) => Ok(self.redisplay()),
            (SurveyPhase::TrainingComplete, ExperimentEvent::Proceed) => Ok(self.begin_trials()),
            (p, ExperimentEvent::Proceed) if p.accepts_proceed() => Ok(self.advance()),
            (SurveyPhase::TrainingStimulus, ExperimentEvent::Choose(side)) => {
                debug!(?side, "training choice discarded");
                Ok(self.advance())
            }
            (SurveyPhase::Trial(question), ExperimentEvent::Choose(side)) => {
                self.answer(question, side)
            }
            _ => Err(TransitionError::NotAccepted { phase, event }),
        }
    }

    fn num_questions(&self) -> u32 {
        self.config.num_questions
    }

    fn advance(&mut self) -> Step {
        let from = self.session.phase;
        let to = from.next(self.num_questions()).unwrap_or(from);
        self.session.phase = to;
        debug!(%from, %to, "phase change");
        Step {
            from,
            to,
            notices: Vec::new(),
        }
    }

    fn redisplay(&self) -> Step {
        let mut step = Step::stay(self.session.phase);
        if self.session.phase.is_terminal() {
            step.notices.extend(self.save_notice());
        }
        step
    }

    fn save_notice(&self) -> Option<Notice> {
        self.session.save_status.as_ref().map(|status| match status {
            SaveStatus::Saved { rows } => Notice::ResponsesSaved { rows: *rows },
            SaveStatus::Failed { reason } => Notice::ResponsesNotSaved {
                reason: reason.clone(),
            },
        })
    }

    /// `TrainingComplete -> Trial(1)`: allocate the id, build the plan and
    /// start timing the first trial.
    fn begin_trials(&mut self) -> Step {
        let mut notices = Vec::new();

        let id = match self.session.participant_id {
            Some(id) => id,
            None => {
                let (id, notice) = self.allocate_participant();
                notices.extend(notice);
                self.session.participant_id = Some(id);
                id
            }
        };

        let planned = match self.config.plan_seed {
            Some(seed) => planner::plan_seeded(id, self.catalog.len(), seed),
            None => planner::plan(id, self.catalog.len(), &mut self.rng),
        };
        self.session.plan = match planned {
            Ok(plan) => {
                info!(participant = %id, rows = ?plan.rows, sequence = ?plan.indices, "trial plan ready");
                Some(plan)
            }
            Err(e) => {
                warn!(participant = %id, error = %e, "could not build a trial plan");
                None
            }
        };

        self.session.session_start = Some(self.clock.now());

        let mut step = self.advance();
        step.notices = notices;
        step
    }

    fn allocate_participant(&mut self) -> (ParticipantId, Option<Notice>) {
        match self.identity.allocate() {
            Ok(id) => {
                info!(participant = %id, "participant id allocated");
                (id, None)
            }
            Err(e) => {
                let (a, b) = self.config.fallback_id_range;
                let id = ParticipantId(self.rng.random_range(a.min(b)..=a.max(b)));
                warn!(error = %e, participant = %id, "identity source failed, using random id");
                (
                    id,
                    Some(Notice::FallbackParticipantId {
                        id,
                        reason: e.to_string(),
                    }),
                )
            }
        }
    }

    /// Records the answer to `question` and auto-advances.
    fn answer(&mut self, question: u32, side: Side) -> Result<Step, TransitionError> {
        if let Err(e) = self.stimulus_for(question) {
            warn!(question, error = %e, "trial cannot be answered");
            return Err(e);
        }

        let now = self.clock.now();
        let started = self.session.session_start.unwrap_or(now);
        let elapsed = seconds_between(started, now);
        self.session.answers.insert(question, side);
        self.session.timings.insert(question, elapsed);
        debug!(question, ?side, elapsed, "answer recorded");

        let n = self.num_questions();
        if question < n {
            self.session.session_start = Some(now);
            return Ok(self.advance());
        }

        if !self.session.all_answered(n) {
            let err = TransitionError::IncompleteAnswers {
                answered: self.session.answered(),
                expected: n as usize,
            };
            warn!(error = %err, "last trial answered with gaps, not completing");
            return Err(err);
        }

        let mut step = self.advance();
        step.notices.extend(self.flush());
        Ok(step)
    }

    /// Writes all rows to the sink. Runs at most once per session.
    fn flush(&mut self) -> Option<Notice> {
        if self.session.save_status.is_some() {
            return None;
        }
        let written_at = self.clock.now();
        let status = match self.session.results(self.num_questions()) {
            Some(results) => {
                let rows: Vec<ResponseRecord> =
                    results.iter().map(|r| r.to_record(written_at)).collect();
                match self.sink.append(&rows) {
                    Ok(()) => {
                        info!(sink = self.sink.name(), rows = rows.len(), "responses saved");
                        SaveStatus::Saved { rows: rows.len() }
                    }
                    Err(e) => {
                        warn!(sink = self.sink.name(), error = %e, "saving responses failed");
                        SaveStatus::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            None => {
                warn!("session completed without a participant id or start time");
                SaveStatus::Failed {
                    reason: "session was never started".to_string(),
                }
            }
        };
        self.session.save_status = Some(status);
        self.save_notice()
    }

    fn stimulus_for(&self, question: u32) -> Result<&Stimulus, TransitionError> {
        let index = self
            .session
            .plan
            .as_ref()
            .and_then(|p| p.stimulus_index(question));
        index
            .and_then(|i| self.catalog.get(i))
            .ok_or(TransitionError::MissingStimulus { question, index })
    }

    /// What the current phase presents, if anything.
    pub fn current_stimulus(&self) -> Result<Option<&Stimulus>, TransitionError> {
        match self.session.phase {
            SurveyPhase::TrainingStimulus => Ok(self.catalog.training()),
            SurveyPhase::Trial(q) => self.stimulus_for(q).map(Some),
            _ => Ok(None),
        }
    }

    pub fn current_phase(&self) -> SurveyPhase {
        self.session.phase
    }

    /// `(question, total)` while a graded trial is shown.
    pub fn progress(&self) -> Option<(u32, u32)> {
        self.session
            .phase
            .question()
            .map(|q| (q, self.num_questions()))
    }

    pub fn is_completed(&self) -> bool {
        self.session.phase.is_terminal()
    }

    pub fn participant_id(&self) -> Option<ParticipantId> {
        self.session.participant_id
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.session.save_status.as_ref()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn into_session(self) -> SessionState {
        self.session
    }

    pub fn catalog(&self) -> &StimulusCatalog {
        &self.catalog
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }
}
