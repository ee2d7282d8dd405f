use serde::{Deserialize, Serialize};

/// Number of scenes in the paired-block design. Each scene contributes two
/// stimuli, one per presentation direction.
pub const SCENE_COUNT: usize = 6;

/// A single presentable stimulus (a video source in the observed deployment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimulus {
    pub index: usize,
    pub source: String,
}

/// The two presentation directions of one scene, as catalog indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenePair {
    /// Direction 0, A-then-B.
    pub forward: usize,
    /// Direction 1, B-then-A.
    pub reverse: usize,
}

impl ScenePair {
    /// Consecutive catalog entries `(2k, 2k + 1)` form scene `k`.
    pub fn for_scene(scene: usize) -> Self {
        Self {
            forward: 2 * scene,
            reverse: 2 * scene + 1,
        }
    }

    pub fn swapped(self) -> Self {
        Self {
            forward: self.reverse,
            reverse: self.forward,
        }
    }
}

/// Ordered, immutable list of graded stimuli plus an optional training
/// stimulus that is never part of a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StimulusCatalog {
    stimuli: Vec<Stimulus>,
    training: Option<Stimulus>,
}

impl StimulusCatalog {
    pub fn new<I, S>(sources: I, training: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stimuli: Vec<Stimulus> = sources
            .into_iter()
            .enumerate()
            .map(|(index, source)| Stimulus {
                index,
                source: source.into(),
            })
            .collect();
        let training = training.map(|source| Stimulus {
            index: stimuli.len(),
            source,
        });
        Self { stimuli, training }
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Stimulus> {
        self.stimuli.get(index)
    }

    pub fn training(&self) -> Option<&Stimulus> {
        self.training.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.iter()
    }
}

/// The per-participant stimulus order. Created once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialPlan {
    /// Latin-square rows used for the first and second half.
    pub rows: (usize, usize),
    pub indices: Vec<usize>,
}

impl TrialPlan {
    pub fn new(rows: (usize, usize), indices: Vec<usize>) -> Self {
        Self { rows, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Stimulus index for a 1-based question number.
    pub fn stimulus_index(&self, question: u32) -> Option<usize> {
        let slot = (question as usize).checked_sub(1)?;
        self.indices.get(slot).copied()
    }

    pub fn first_half(&self) -> &[usize] {
        &self.indices[..self.indices.len() / 2]
    }

    pub fn second_half(&self) -> &[usize] {
        &self.indices[self.indices.len() / 2..]
    }
}
