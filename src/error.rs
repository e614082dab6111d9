use thiserror::Error;

/// Failure buckets for the player core.
///
/// Every error in the crate is contained at the boundary that produced it
/// and converted into state (an unplayable track, an empty waveform, a
/// cache miss); these values exist so events and logs can say which bucket
/// a failure landed in. None of them terminate the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// The decoder could not open or start a source file.
    #[error("cannot play {path}: {reason}")]
    DecodeOpen { path: String, reason: String },

    /// Waveform analysis produced no usable data.
    #[error("waveform analysis failed for {path}: {reason}")]
    Analysis { path: String, reason: String },

    /// The waveform cache could not be read or written. Always treated as
    /// a miss by callers.
    #[error("waveform cache: {0}")]
    CacheIo(String),
}

pub type PlayerResult<T> = Result<T, PlayerError>;
