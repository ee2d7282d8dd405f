use crate::{ResponseRecord, StoreError};

/// Persistence backend for completed sessions.
///
/// The state machine calls `append` exactly once per completed session, with
/// one row per question in question order.
pub trait ResponseSink {
    fn append(&mut self, rows: &[ResponseRecord]) -> Result<(), StoreError>;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

impl<T: ResponseSink + ?Sized> ResponseSink for Box<T> {
    fn append(&mut self, rows: &[ResponseRecord]) -> Result<(), StoreError> {
        (**self).append(rows)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
