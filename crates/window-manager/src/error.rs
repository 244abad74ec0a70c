//! Error types

/// Window manager error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowManagerError {
    #[error("an instance is already running for origin {0}")]
    DuplicateOrigin(String),

    #[error("no instance is running for origin {0}")]
    NotRunning(String),

    #[error("unknown manifest: {0}")]
    UnknownManifest(String),

    #[error("homescreen manifest {0} cannot be resolved")]
    MissingHomescreen(String),
}

pub type Result<T> = std::result::Result<T, WindowManagerError>;
