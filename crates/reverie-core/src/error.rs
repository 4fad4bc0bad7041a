/// Result alias carrying the engine error type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy for the soundscape engine.
///
/// Only `Initialization` ever reaches a caller of the public operations;
/// scheduling and disposal failures are caught at the engine boundary,
/// logged and degraded to no-ops.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The shared audio output could not be acquired. Typically the
    /// hosting environment requires a prior user interaction before an
    /// output can be opened. Non-fatal: `initialize()` may be retried.
    #[error("audio output unavailable: {0}")]
    Initialization(String),

    /// A cadence could not be armed or a scheduled callback failed.
    #[error("scheduling failed: {0}")]
    Scheduling(String),

    /// A graph node could not be disposed. Treated as already-clean.
    #[error("node disposal failed: {0}")]
    Disposal(String),
}

impl EngineError {
    pub fn initialization<T: Into<String>>(msg: T) -> Self {
        Self::Initialization(msg.into())
    }

    pub fn scheduling<T: Into<String>>(msg: T) -> Self {
        Self::Scheduling(msg.into())
    }

    pub fn disposal<T: Into<String>>(msg: T) -> Self {
        Self::Disposal(msg.into())
    }
}
