use crate::domain::track::TrackSnapshot;

/// "Listening" payload handed to the presence display.
///
/// Timestamps are absolute epoch seconds: `start` is when the track would
/// have begun given the current position, `end` is when it will finish. A
/// track with unknown duration gets `end == start`, which displays without a
/// countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceDescriptor {
    pub details: String,
    pub state: String,
    pub start_epoch_secs: i64,
    pub end_epoch_secs: i64,
    pub large_image_url: Option<String>,
    pub large_image_caption: String,
    pub small_image_key: Option<String>,
    pub small_image_caption: Option<String>,
}

impl PresenceDescriptor {
    pub fn listening(
        snapshot: &TrackSnapshot,
        now_epoch_secs: i64,
        art_url: Option<String>,
    ) -> Self {
        let position = snapshot.position.as_secs() as i64;
        let start = now_epoch_secs - position;
        let end = if snapshot.duration.is_zero() {
            start
        } else {
            // a position past the reported duration saturates to "ends now"
            let remaining = snapshot.duration.saturating_sub(snapshot.position);
            now_epoch_secs + remaining.as_secs() as i64
        };

        Self {
            details: snapshot.title.clone().unwrap_or_default(),
            state: snapshot.artist.clone().unwrap_or_default(),
            start_epoch_secs: start,
            end_epoch_secs: end,
            large_image_url: art_url,
            large_image_caption: snapshot
                .album
                .clone()
                .unwrap_or_else(|| "Album Cover".to_string()),
            small_image_key: None,
            small_image_caption: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(title: &str, artist: &str, position: u64, duration: u64) -> TrackSnapshot {
        TrackSnapshot {
            title: Some(title.to_string()),
            artist: Some(artist.to_string()),
            position: Duration::from_secs(position),
            duration: Duration::from_secs(duration),
            ..TrackSnapshot::default()
        }
    }

    #[test]
    fn test_timestamps_window_the_track_around_now() {
        let now = 1_700_000_000;
        let descriptor =
            PresenceDescriptor::listening(&snapshot("A", "X", 10, 180), now, None);

        assert_eq!(descriptor.details, "A");
        assert_eq!(descriptor.state, "X");
        assert_eq!(descriptor.start_epoch_secs, now - 10);
        assert_eq!(descriptor.end_epoch_secs, now + 170);
    }

    #[test]
    fn test_unknown_duration_means_no_countdown() {
        let now = 1_700_000_000;
        let descriptor = PresenceDescriptor::listening(&snapshot("A", "X", 25, 0), now, None);

        assert_eq!(descriptor.start_epoch_secs, now - 25);
        assert_eq!(descriptor.end_epoch_secs, descriptor.start_epoch_secs);
    }

    #[test]
    fn test_position_past_duration_still_orders_timestamps() {
        let now = 1_700_000_000;
        let descriptor =
            PresenceDescriptor::listening(&snapshot("A", "X", 200, 180), now, None);

        assert_eq!(descriptor.end_epoch_secs, now);
        assert!(descriptor.end_epoch_secs >= descriptor.start_epoch_secs);
    }

    #[test]
    fn test_caption_prefers_album_title() {
        let now = 1_700_000_000;
        let mut snap = snapshot("A", "X", 0, 60);

        let descriptor = PresenceDescriptor::listening(&snap, now, None);
        assert_eq!(descriptor.large_image_caption, "Album Cover");

        snap.album = Some("The Album".to_string());
        let descriptor = PresenceDescriptor::listening(&snap, now, None);
        assert_eq!(descriptor.large_image_caption, "The Album");
    }

    #[test]
    fn test_art_url_is_carried_through() {
        let url = "http://localhost:8080/album_image/current_album.jpg?id=00000000000000000000000000000001";
        let descriptor = PresenceDescriptor::listening(
            &snapshot("A", "X", 0, 60),
            1_700_000_000,
            Some(url.to_string()),
        );

        assert_eq!(descriptor.large_image_url.as_deref(), Some(url));
    }
}
