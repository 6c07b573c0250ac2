//! Error types surfaced by the player.

use thiserror::Error;

/// Error type produced by collaborators (fetchers, decoders).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum WaveError {
    /// An operation needs decoded audio but no load has completed yet.
    #[error("no audio has been loaded")]
    NothingLoaded,

    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to decode audio")]
    Decode {
        #[source]
        source: BoxError,
    },
}
