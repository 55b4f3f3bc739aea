use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The mailbox cannot be located: no project descriptor at the root.
    #[error("no project.godot found in {}", .0.display())]
    ProjectNotFound(PathBuf),

    /// No parseable result appeared within the deadline. Distinct from a
    /// responder that answered with an error.
    #[error(
        "no response to '{action}' after {}s - is the game running with the DevTools autoload?",
        .timeout.as_secs_f64()
    )]
    NoResponse { action: String, timeout: Duration },

    /// The responder executed the action and reported failure.
    #[error("{action} failed: {message}")]
    Remote { action: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
