use std::time::Duration;

/// Point-in-time reading of the media provider's current session.
///
/// A `None` title means the provider has no active track to report. The cover
/// image is carried as fully-read bytes so downstream consumers never hold a
/// provider stream open.
#[derive(Debug, Clone, Default)]
pub struct TrackSnapshot {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub position: Duration,
    pub duration: Duration,
    pub paused: bool,
    pub artwork: Option<Vec<u8>>,
}

impl TrackSnapshot {
    /// Identity of the playing item, used to detect track boundaries.
    pub fn signature(&self) -> Option<TrackSignature> {
        self.title.as_ref().map(|title| TrackSignature {
            title: title.clone(),
            artist: self.artist.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSignature {
    pub title: String,
    pub artist: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_requires_title() {
        let snapshot = TrackSnapshot {
            artist: Some("Artist".to_string()),
            ..TrackSnapshot::default()
        };
        assert_eq!(snapshot.signature(), None);
    }

    #[test]
    fn test_signature_tracks_title_and_artist() {
        let snapshot = TrackSnapshot {
            title: Some("Song".to_string()),
            artist: Some("Artist".to_string()),
            album: Some("Album".to_string()),
            ..TrackSnapshot::default()
        };

        let signature = snapshot.signature().unwrap();
        assert_eq!(signature.title, "Song");
        assert_eq!(signature.artist.as_deref(), Some("Artist"));

        let same_track_later = TrackSnapshot {
            position: Duration::from_secs(42),
            artwork: Some(vec![1, 2, 3]),
            ..snapshot.clone()
        };
        assert_eq!(same_track_later.signature(), Some(signature));
    }
}
