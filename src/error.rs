use thiserror::Error;

/// Unified error contract for every deployment operation. The CLI entry
/// point is the only place that turns one of these into an exit code.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("remote command exited with status {status}: {command}")]
    RemoteExec { command: String, status: i32 },

    #[error("command template error in {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("domain verification failed: {0}")]
    Verification(String),

    #[error("build step failed: {0}")]
    Build(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ssh2::Error> for DeployError {
    fn from(err: ssh2::Error) -> Self {
        DeployError::Transfer(err.to_string())
    }
}

impl From<walkdir::Error> for DeployError {
    fn from(err: walkdir::Error) -> Self {
        DeployError::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
