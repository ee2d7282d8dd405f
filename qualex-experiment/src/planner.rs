//! Counterbalanced stimulus ordering.
//!
//! The default design pairs the two presentation directions of each scene
//! and splits them across the two halves of the session: the first half
//! shows one direction of every scene in the order given by one row of a
//! 6x6 balanced Latin square, the second half shows the other direction in
//! the order of the next row.

use qualex_core::{ParticipantId, SCENE_COUNT, ScenePair, TrialPlan};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Balanced Latin square of order 6. Every scene occupies every position
/// once, and every ordered pair of scenes is adjacent exactly once.
pub const BALANCED_LATIN_SQUARE_6: [[usize; SCENE_COUNT]; SCENE_COUNT] = [
    [0, 1, 2, 3, 4, 5],
    [1, 3, 0, 5, 2, 4],
    [3, 5, 1, 4, 0, 2],
    [5, 4, 3, 2, 1, 0],
    [4, 2, 5, 0, 3, 1],
    [2, 0, 4, 1, 5, 3],
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("paired-block plans need a catalog of {expected} stimuli, got {actual}")]
    UnsupportedCatalogSize { expected: usize, actual: usize },
}

/// Latin-square rows used for a participant's first and second half.
pub fn latin_rows(participant: ParticipantId) -> (usize, usize) {
    let n = SCENE_COUNT as u64;
    let id = participant.get();
    ((id % n) as usize, ((id % n + 1) % n) as usize)
}

/// Builds the trial order for `participant`.
///
/// `rng` only decides which direction of each scene is shown first; the
/// scene order comes from the Latin square and depends on the id alone.
pub fn plan<R: Rng>(
    participant: ParticipantId,
    catalog_size: usize,
    rng: &mut R,
) -> Result<TrialPlan, PlanError> {
    let expected = 2 * SCENE_COUNT;
    if catalog_size != expected {
        return Err(PlanError::UnsupportedCatalogSize {
            expected,
            actual: catalog_size,
        });
    }

    let flipped: Vec<ScenePair> = (0..SCENE_COUNT)
        .map(|k| {
            let pair = ScenePair::for_scene(k);
            if rng.random_bool(0.5) { pair.swapped() } else { pair }
        })
        .collect();

    let (first_row, second_row) = latin_rows(participant);
    let first = BALANCED_LATIN_SQUARE_6[first_row]
        .iter()
        .map(|&scene| flipped[scene].forward);
    let second = BALANCED_LATIN_SQUARE_6[second_row]
        .iter()
        .map(|&scene| flipped[scene].reverse);

    Ok(TrialPlan::new(
        (first_row, second_row),
        first.chain(second).collect(),
    ))
}

/// Like [`plan`], with direction flips drawn from a generator seeded by
/// `seed + participant`, so the same id always yields the same plan.
pub fn plan_seeded(
    participant: ParticipantId,
    catalog_size: usize,
    seed: u64,
) -> Result<TrialPlan, PlanError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(participant.get()));
    plan(participant, catalog_size, &mut rng)
}

/// Williams-design ordering of `items` for one participant, for catalogs
/// without the paired-direction structure.
///
/// For an even number of items, participants `0..n` together form a
/// balanced Latin square. For odd `n`, odd participants get the reversed
/// sequence so that `2n` participants balance first-order carryover.
pub fn balanced_latin_square<T: Clone>(items: &[T], participant: u64) -> Vec<T> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }
    let (mut j, mut h) = (0usize, 0usize);
    let mut row: Vec<T> = (0..n)
        .map(|i| {
            let offset = if i < 2 || i % 2 != 0 {
                j += 1;
                j - 1
            } else {
                h += 1;
                n - h
            };
            let idx = ((offset as u64 + participant) % n as u64) as usize;
            items[idx].clone()
        })
        .collect();
    if n % 2 != 0 && participant % 2 != 0 {
        row.reverse();
    }
    row
}
