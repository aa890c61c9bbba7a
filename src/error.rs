use thiserror::Error;

/// Errors raised while setting up a tracker.
///
/// Per-frame tracking never fails; unmatched tracks simply age out.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
