use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use qualex_core::{Choice, ParticipantId, Side, SurveyPhase, TrialPlan, TrialResult};

/// Outcome of the single end-of-session flush.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved { rows: usize },
    Failed { reason: String },
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved { .. })
    }
}

/// Everything one participant's session knows. Owned by exactly one
/// state machine and discarded with it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: SurveyPhase,
    pub participant_id: Option<ParticipantId>,
    pub plan: Option<TrialPlan>,
    /// Keyed by 1-based question number.
    pub answers: BTreeMap<u32, Side>,
    /// Seconds spent on each question, keyed like `answers`.
    pub timings: BTreeMap<u32, f64>,
    /// Entry time of the trial on screen. Reset on every answer except the
    /// last, so a finished session holds the moment its final trial began.
    pub session_start: Option<NaiveDateTime>,
    pub save_status: Option<SaveStatus>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    /// True when every question `1..=num_questions` has an answer.
    pub fn all_answered(&self, num_questions: u32) -> bool {
        (1..=num_questions).all(|q| self.answers.contains_key(&q))
    }

    /// One result per question slot, in question order. Unanswered slots
    /// carry `Choice::NoAnswer` and zero elapsed time. `None` before the
    /// graded part of the session has started.
    pub fn results(&self, num_questions: u32) -> Option<Vec<TrialResult>> {
        let participant_id = self.participant_id?;
        let session_start = self.session_start?;
        Some(
            (1..=num_questions)
                .map(|question| TrialResult {
                    participant_id,
                    question,
                    stimulus_index: self
                        .plan
                        .as_ref()
                        .and_then(|p| p.stimulus_index(question)),
                    choice: Choice::from(self.answers.get(&question).copied()),
                    elapsed_seconds: self.timings.get(&question).copied().unwrap_or(0.0),
                    session_start,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn results_cover_every_slot() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        let mut session = SessionState {
            participant_id: Some(ParticipantId(4)),
            plan: Some(TrialPlan::new((4, 5), vec![3, 0, 8])),
            session_start: Some(start),
            ..SessionState::new()
        };
        session.answers.insert(1, Side::Left);
        session.timings.insert(1, 1.25);
        session.answers.insert(3, Side::Right);
        session.timings.insert(3, 0.5);

        let results = session.results(4).unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].choice, Choice::Left);
        assert_eq!(results[0].stimulus_index, Some(3));
        assert_eq!(results[1].choice, Choice::NoAnswer);
        assert_eq!(results[1].elapsed_seconds, 0.0);
        assert_eq!(results[2].elapsed_seconds, 0.5);
        assert_eq!(results[3].stimulus_index, None);
        assert!(results.iter().all(|r| r.session_start == start));
        assert!(!session.all_answered(3));
    }

    #[test]
    fn no_results_before_trials_start() {
        assert!(SessionState::new().results(12).is_none());
    }
}
