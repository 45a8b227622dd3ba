use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};

use crate::artwork::AlbumArtCache;
use crate::domain::token::AccessToken;
use crate::domain::track::{TrackSignature, TrackSnapshot};
use crate::http::ART_RESOURCE_PATH;
use crate::media::{MediaEvent, MediaSource};
use crate::presence::descriptor::PresenceDescriptor;
use crate::presence::sink::PresenceSink;

/// Cadence of the sink's housekeeping tick while no notifications arrive.
const FLUSH_INTERVAL: Duration = Duration::from_millis(1000 / 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session attached.
    Idle,
    /// Session attached but it has not reported a usable track yet.
    Tracking,
    Playing,
    Paused,
}

/// Turns the provider's notification stream into a minimal sequence of
/// presence publishes, clears and cover replacements.
///
/// Re-notifications of the same playing track re-publish with fresh
/// timestamps but never rotate the cover token; a new `(title, artist)`
/// identity is a track boundary and swaps the cached cover under a freshly
/// minted token before the publish goes out.
pub struct Synchronizer<S> {
    sink: S,
    cache: Arc<AlbumArtCache>,
    art_base_url: String,
    phase: Phase,
    last_signature: Option<TrackSignature>,
    art_token: Option<AccessToken>,
    published: bool,
}

impl<S: PresenceSink> Synchronizer<S> {
    pub fn new(sink: S, cache: Arc<AlbumArtCache>, art_base_url: String) -> Self {
        Self {
            sink,
            cache,
            art_base_url,
            phase: Phase::Idle,
            last_signature: None,
            art_token: None,
            published: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A session came up, or replaced the previous one. Resets the
    /// idempotence state and runs the initial evaluation, which never emits
    /// the paused-clear (a session discovered already paused stays silent).
    pub fn session_attached(&mut self, snapshot: &TrackSnapshot) {
        self.phase = Phase::Tracking;
        self.last_signature = None;
        self.published = false;
        self.evaluate_inner(snapshot, true, false);
    }

    /// The provider no longer has a session for us.
    pub fn session_lost(&mut self) {
        if self.published {
            self.clear_presence();
        }
        self.phase = Phase::Idle;
        self.last_signature = None;
    }

    /// Re-evaluate after a change notification. `new_item` forces a track
    /// boundary, for providers able to signal playback starting over on a
    /// new item without any metadata change.
    pub fn evaluate(&mut self, snapshot: &TrackSnapshot, new_item: bool) -> bool {
        self.evaluate_inner(snapshot, false, new_item)
    }

    fn evaluate_inner(&mut self, snapshot: &TrackSnapshot, initial: bool, new_item: bool) -> bool {
        if snapshot.paused {
            if !initial && self.published {
                info!("playback paused; clearing presence");
                self.clear_presence();
            }
            self.phase = Phase::Paused;
            return false;
        }

        let Some(signature) = snapshot.signature() else {
            // session exists but reports nothing yet
            return false;
        };

        if new_item || self.last_signature.as_ref() != Some(&signature) {
            self.rotate_cover(snapshot);
        }

        let descriptor =
            PresenceDescriptor::listening(snapshot, Utc::now().timestamp(), self.art_url());
        match self.sink.publish(&descriptor) {
            Ok(()) => info!("presence updated via {}", self.sink.name()),
            Err(e) => warn!("presence update failed: {e}"),
        }
        self.published = true;
        self.last_signature = Some(signature);
        self.phase = Phase::Playing;
        true
    }

    /// Swap the cached cover under a fresh token. A snapshot without art
    /// leaves the previous image and token untouched; a failed swap keeps
    /// them too, so the publish still carries the previous working URL.
    fn rotate_cover(&mut self, snapshot: &TrackSnapshot) {
        let Some(art) = &snapshot.artwork else { return };
        let token = AccessToken::mint();
        match self.cache.replace(art.clone(), token) {
            Ok(()) => self.art_token = Some(token),
            Err(e) => warn!("failed to store album cover: {e}"),
        }
    }

    fn art_url(&self) -> Option<String> {
        self.art_token.map(|token| {
            format!(
                "{}{}?id={}",
                self.art_base_url.trim_end_matches('/'),
                ART_RESOURCE_PATH,
                token
            )
        })
    }

    fn clear_presence(&mut self) {
        match self.sink.clear() {
            Ok(()) => info!("presence cleared"),
            Err(e) => warn!("presence clear failed: {e}"),
        }
        self.published = false;
    }

    pub fn flush(&mut self) {
        if let Err(e) = self.sink.flush() {
            log::debug!("{} flush failed: {e}", self.sink.name());
        }
    }

    /// Final clear on the way out so the display does not keep showing a
    /// track nobody is playing.
    pub fn shutdown(&mut self) {
        if self.published {
            self.clear_presence();
        }
    }
}

/// Dedicated evaluation loop: consumes provider notifications one at a time,
/// so publish order matches notification order, and pumps the sink's
/// transport between them.
pub fn drive<S: PresenceSink>(
    events: &Receiver<MediaEvent>,
    source: &mut dyn MediaSource,
    sync: &mut Synchronizer<S>,
) {
    handle_attach(source, sync);

    loop {
        let event = match events.recv_timeout(FLUSH_INTERVAL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                sync.flush();
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // Coalesce whatever queued up behind the in-flight evaluation: one
        // re-evaluation covers the whole burst, and a session swap
        // supersedes plain change notifications.
        let mut replaced = event == MediaEvent::SessionReplaced;
        while let Ok(extra) = events.try_recv() {
            replaced |= extra == MediaEvent::SessionReplaced;
        }

        if replaced {
            info!("media session changed");
            handle_attach(source, sync);
        } else {
            reevaluate(source, sync);
        }
    }

    sync.shutdown();
}

fn handle_attach<S: PresenceSink>(source: &mut dyn MediaSource, sync: &mut Synchronizer<S>) {
    match source.attach() {
        Ok(true) => {
            // a failed read degrades to "no track", it never kills the loop
            let snapshot = source.snapshot().unwrap_or_else(|e| {
                warn!("media session read failed: {e}");
                TrackSnapshot::default()
            });
            sync.session_attached(&snapshot);
        }
        Ok(false) => {
            info!("no media session is currently active");
            sync.session_lost();
        }
        Err(e) => {
            warn!("failed to attach media session: {e}");
            sync.session_lost();
        }
    }
}

fn reevaluate<S: PresenceSink>(source: &mut dyn MediaSource, sync: &mut Synchronizer<S>) {
    if sync.phase() == Phase::Idle {
        return;
    }
    match source.snapshot() {
        Ok(snapshot) => {
            sync.evaluate(&snapshot, false);
        }
        Err(e) => warn!("media session read failed: {e}"),
    }
}
