use thiserror::Error;

use crate::domain::track::TrackSnapshot;

#[cfg(windows)]
pub mod gsmtc;

/// Discrete change notification pushed by a media session provider into the
/// evaluation loop's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// The provider swapped its current session (or dropped it entirely).
    SessionReplaced,
    MetadataChanged,
    PlaybackChanged,
    TimelineChanged,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media session unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to the OS media session provider.
///
/// `attach` rebinds to the provider's current session, revoking any previous
/// subscriptions first; it returns `false` when no session exists. `snapshot`
/// is a blocking read of the attached session, including the cover image
/// bytes.
pub trait MediaSource {
    fn attach(&mut self) -> Result<bool, MediaError>;

    fn snapshot(&mut self) -> Result<TrackSnapshot, MediaError>;
}
