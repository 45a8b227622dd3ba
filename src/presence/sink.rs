use std::fmt::Display;
use std::time::{Duration, Instant};

use discord_rich_presence::{
    DiscordIpc, DiscordIpcClient,
    activity::{Activity, ActivityType, Assets, Timestamps},
};
use thiserror::Error;

use crate::presence::descriptor::PresenceDescriptor;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("presence transport error: {0}")]
    Transport(String),
}

/// Boundary to the external rich-presence display.
///
/// Publish and clear are fire-and-forget from the synchronizer's point of
/// view: the result is logged by the caller and never feeds back into its
/// state. `flush` is invoked at a fixed cadence from the idle loop so the
/// transport can run whatever housekeeping it needs.
pub trait PresenceSink {
    /// Short transport name for log lines.
    fn name(&self) -> &'static str;

    fn publish(&mut self, descriptor: &PresenceDescriptor) -> Result<(), SinkError>;

    fn clear(&mut self) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

const RECONNECT_INTERVAL: Duration = Duration::from_secs(15);

/// Presence sink over the local Discord client's IPC socket.
///
/// The client may not be running when we start, or may go away mid-session;
/// the connection is (re)established lazily from `flush` and before each
/// publish, with a backoff so a missing client does not get hammered 60 times
/// a second.
pub struct DiscordSink {
    client: DiscordIpcClient,
    connected: bool,
    last_attempt: Option<Instant>,
}

impl DiscordSink {
    pub fn new(client_id: &str) -> Result<Self, SinkError> {
        let client = DiscordIpcClient::new(client_id).map_err(transport)?;
        Ok(Self {
            client,
            connected: false,
            last_attempt: None,
        })
    }

    fn due_for_retry(&self) -> bool {
        self.last_attempt
            .is_none_or(|at| at.elapsed() >= RECONNECT_INTERVAL)
    }

    fn connect_now(&mut self) -> Result<(), SinkError> {
        self.last_attempt = Some(Instant::now());
        self.client.connect().map_err(transport)?;
        self.connected = true;
        log::info!("connected to rich-presence transport");
        Ok(())
    }

    fn ensure_connected(&mut self) -> Result<(), SinkError> {
        if self.connected {
            Ok(())
        } else if self.due_for_retry() {
            self.connect_now()
        } else {
            Err(SinkError::Transport(
                "rich-presence transport not connected".into(),
            ))
        }
    }
}

impl PresenceSink for DiscordSink {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn publish(&mut self, descriptor: &PresenceDescriptor) -> Result<(), SinkError> {
        self.ensure_connected()?;

        let mut timestamps = Timestamps::new().start(descriptor.start_epoch_secs);
        if descriptor.end_epoch_secs > descriptor.start_epoch_secs {
            timestamps = timestamps.end(descriptor.end_epoch_secs);
        }

        let mut activity = Activity::new()
            .activity_type(ActivityType::Listening)
            .details(&descriptor.details)
            .state(&descriptor.state)
            .timestamps(timestamps);

        if let Some(url) = &descriptor.large_image_url {
            let mut assets = Assets::new()
                .large_image(url)
                .large_text(&descriptor.large_image_caption);
            if let Some(key) = &descriptor.small_image_key {
                assets = assets.small_image(key);
            }
            if let Some(caption) = &descriptor.small_image_caption {
                assets = assets.small_text(caption);
            }
            activity = activity.assets(assets);
        }

        let result = self.client.set_activity(activity);
        if result.is_err() {
            // drop the connection so the next flush tick reconnects
            self.connected = false;
        }
        result.map_err(transport)
    }

    fn clear(&mut self) -> Result<(), SinkError> {
        self.ensure_connected()?;

        let result = self.client.clear_activity();
        if result.is_err() {
            self.connected = false;
        }
        result.map_err(transport)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if !self.connected && self.due_for_retry() {
            self.connect_now()?;
        }
        Ok(())
    }
}

fn transport(e: impl Display) -> SinkError {
    SinkError::Transport(e.to_string())
}
