/// Errors raised by the identity and persistence collaborators.
///
/// None of these are fatal to a session: identity failures fall back to a
/// random id and persistence failures are reported as a notice.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be interpreted.
    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("serialization error: {0}")]
    Serialize(String),

    /// The backend is unreachable, locked, or otherwise refused the call.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
