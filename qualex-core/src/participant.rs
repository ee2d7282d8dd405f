use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Externally allocated participant number, fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Hands out participant ids from a shared, persisted counter.
///
/// Implementations must serialize concurrent `allocate` calls so that two
/// sessions never receive the same id from a healthy backend.
pub trait IdentitySource: Send + Sync {
    fn allocate(&self) -> Result<ParticipantId, StoreError>;
}

impl<T: IdentitySource + ?Sized> IdentitySource for Arc<T> {
    fn allocate(&self) -> Result<ParticipantId, StoreError> {
        (**self).allocate()
    }
}

impl<T: IdentitySource + ?Sized> IdentitySource for &T {
    fn allocate(&self) -> Result<ParticipantId, StoreError> {
        (**self).allocate()
    }
}
