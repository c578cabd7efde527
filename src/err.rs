use std::process::{ExitCode, Termination};

/// Fatal, typed errors surfaced by the store and the clustering driver.
///
/// These are the only error kind the core can return to a caller; programmer
/// errors (e.g. `min_pts < 3`) are reported as assertions instead, since they
/// are not recoverable and not something a caller should branch on.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Termination for AppError {
    fn report(self) -> ExitCode {
        ExitCode::from(1)
    }
}
