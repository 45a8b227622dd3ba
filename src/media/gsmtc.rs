use std::future::IntoFuture;
use std::sync::mpsc::Sender;
use std::time::Duration;

use futures::executor::block_on;
use windows::{
    Foundation::{TimeSpan, TypedEventHandler},
    Media::Control::{
        GlobalSystemMediaTransportControlsSession,
        GlobalSystemMediaTransportControlsSessionManager,
        GlobalSystemMediaTransportControlsSessionMediaProperties,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus,
    },
    Storage::Streams::{
        DataReader, IRandomAccessStreamReference, IRandomAccessStreamWithContentType,
        InputStreamOptions,
    },
    Win32::{
        Foundation::RPC_E_CHANGED_MODE,
        System::Com::{COINIT_MULTITHREADED, CoInitializeEx},
    },
    core::Result as WinResult,
};

use crate::domain::track::TrackSnapshot;
use crate::media::{MediaError, MediaEvent, MediaSource};

/// Media source backed by the Windows Global System Media Transport Controls
/// session manager. Change notifications are forwarded into the evaluation
/// loop's channel from WinRT event handlers.
pub struct GsmtcSource {
    manager: GlobalSystemMediaTransportControlsSessionManager,
    manager_token: i64,
    session: Option<GlobalSystemMediaTransportControlsSession>,
    listener_tokens: Option<(i64, i64, i64)>,
    events: Sender<MediaEvent>,
}

impl GsmtcSource {
    pub fn new(events: Sender<MediaEvent>) -> Result<Self, MediaError> {
        init_com()?;

        let manager = block_on_operation(
            GlobalSystemMediaTransportControlsSessionManager::RequestAsync().map_err(win_err)?,
        )
        .map_err(win_err)?;

        let tx = events.clone();
        let manager_token = manager
            .CurrentSessionChanged(&TypedEventHandler::new(move |_, _| {
                let _ = tx.send(MediaEvent::SessionReplaced);
                Ok(())
            }))
            .map_err(win_err)?;

        Ok(Self {
            manager,
            manager_token,
            session: None,
            listener_tokens: None,
            events,
        })
    }

    fn detach_session(&mut self) {
        if let Some(session) = self.session.take() {
            if let Some(tokens) = self.listener_tokens.take() {
                let _ = session.RemoveMediaPropertiesChanged(tokens.0);
                let _ = session.RemovePlaybackInfoChanged(tokens.1);
                let _ = session.RemoveTimelinePropertiesChanged(tokens.2);
            }
        }
    }
}

impl MediaSource for GsmtcSource {
    fn attach(&mut self) -> Result<bool, MediaError> {
        self.detach_session();

        let session = match self.manager.GetCurrentSession() {
            Ok(session) => session,
            Err(_) => return Ok(false),
        };

        let tx_media = self.events.clone();
        let tx_playback = self.events.clone();
        let tx_timeline = self.events.clone();

        let tokens = (
            session
                .MediaPropertiesChanged(&TypedEventHandler::new(move |_, _| {
                    let _ = tx_media.send(MediaEvent::MetadataChanged);
                    Ok(())
                }))
                .map_err(win_err)?,
            session
                .PlaybackInfoChanged(&TypedEventHandler::new(move |_, _| {
                    let _ = tx_playback.send(MediaEvent::PlaybackChanged);
                    Ok(())
                }))
                .map_err(win_err)?,
            session
                .TimelinePropertiesChanged(&TypedEventHandler::new(move |_, _| {
                    let _ = tx_timeline.send(MediaEvent::TimelineChanged);
                    Ok(())
                }))
                .map_err(win_err)?,
        );

        if let Ok(source) = session.SourceAppUserModelId() {
            log::info!("media session source: {}", source.to_string_lossy());
        }

        self.listener_tokens = Some(tokens);
        self.session = Some(session);
        Ok(true)
    }

    fn snapshot(&mut self) -> Result<TrackSnapshot, MediaError> {
        let Some(session) = &self.session else {
            return Ok(TrackSnapshot::default());
        };

        let props =
            block_on_operation(session.TryGetMediaPropertiesAsync().map_err(win_err)?)
                .map_err(win_err)?;
        let timeline = session.GetTimelineProperties().map_err(win_err)?;
        let playback = session.GetPlaybackInfo().map_err(win_err)?;

        let paused = playback.PlaybackStatus().map_err(win_err)?
            == GlobalSystemMediaTransportControlsSessionPlaybackStatus::Paused;

        let position = time_span_duration(timeline.Position().map_err(win_err)?);
        let start = time_span_duration(timeline.StartTime().map_err(win_err)?);
        let end = time_span_duration(timeline.EndTime().map_err(win_err)?);
        let duration = end.saturating_sub(start);

        let artwork = load_thumbnail_bytes(&props).unwrap_or_else(|e| {
            log::debug!("thumbnail read failed: {e}");
            None
        });

        Ok(TrackSnapshot {
            title: non_empty(props.Title().map_err(win_err)?.to_string_lossy()),
            artist: non_empty(props.Artist().map_err(win_err)?.to_string_lossy()),
            album: non_empty(props.AlbumTitle().map_err(win_err)?.to_string_lossy()),
            position,
            duration,
            paused,
            artwork,
        })
    }
}

impl Drop for GsmtcSource {
    fn drop(&mut self) {
        self.detach_session();
        let _ = self.manager.RemoveCurrentSessionChanged(self.manager_token);
    }
}

fn load_thumbnail_bytes(
    props: &GlobalSystemMediaTransportControlsSessionMediaProperties,
) -> WinResult<Option<Vec<u8>>> {
    let reference: IRandomAccessStreamReference = match props.Thumbnail() {
        Ok(reference) => reference,
        Err(_) => return Ok(None),
    };

    let stream: IRandomAccessStreamWithContentType =
        block_on_operation(reference.OpenReadAsync()?)?;
    let input_stream = stream.GetInputStreamAt(0)?;
    let reader = DataReader::CreateDataReader(&input_stream)?;
    reader.SetInputStreamOptions(InputStreamOptions::Partial)?;

    let mut buffer = Vec::new();
    const CHUNK: u32 = 64 * 1024;

    loop {
        let loaded = block_on_operation(reader.LoadAsync(CHUNK)?)?;
        if loaded == 0 {
            break;
        }
        let mut chunk = vec![0u8; loaded as usize];
        reader.ReadBytes(&mut chunk)?;
        buffer.extend_from_slice(&chunk);
        if loaded < CHUNK {
            break;
        }
    }

    Ok(Some(buffer))
}

fn block_on_operation<O, T>(operation: O) -> WinResult<T>
where
    O: IntoFuture<Output = WinResult<T>>,
{
    block_on(operation.into_future())
}

fn init_com() -> Result<(), MediaError> {
    let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
    if hr.is_ok() || hr == RPC_E_CHANGED_MODE {
        Ok(())
    } else {
        Err(MediaError::Unavailable(format!("COM init failed: {hr:?}")))
    }
}

/// GSMTC reports missing fields as empty strings rather than nulls.
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn time_span_duration(span: TimeSpan) -> Duration {
    // TimeSpan counts 100ns ticks
    Duration::from_nanos(span.Duration.max(0) as u64 * 100)
}

fn win_err(e: windows::core::Error) -> MediaError {
    MediaError::Unavailable(e.to_string())
}
