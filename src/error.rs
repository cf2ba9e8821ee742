use thiserror::Error;

/// Errors produced by the tracking registry and the Pomodoro engine.
///
/// All variants are local and non-fatal: the rejected operation leaves
/// state untouched and the caller decides how to surface the failure.
/// The tick loop itself never returns an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An operation referenced a project name that is not in the registry.
    #[error("no project named '{0}'")]
    ProjectNotFound(String),

    /// Adding or renaming would break the name-uniqueness invariant.
    #[error("a project named '{0}' already exists")]
    ProjectExists(String),

    /// A settings update carried a non-positive duration or cycle count.
    #[error("invalid pomodoro configuration: {0}")]
    InvalidConfiguration(String),

    /// An operation was called in a state that does not allow it
    /// (e.g. advancing a phase that is not waiting).
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl EngineError {
    /// True if the error means the referenced project does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_))
    }
}
