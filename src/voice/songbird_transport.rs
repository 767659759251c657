//! [`VoiceTransport`] backed by songbird.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::error::JoinError;
use songbird::input::{File, HttpRequest, Input};
use songbird::tracks::TrackHandle;
use songbird::{Event, EventContext, EventHandler, Songbird, TrackEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use super::error::{VoiceError, VoiceResult};
use super::source::AudioSource;
use super::transport::{StartedTrack, TrackControl, VoiceTransport};

pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http_client: reqwest::Client,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, http_client: reqwest::Client) -> Self {
        Self {
            manager,
            http_client,
        }
    }

    fn input_for(&self, source: &AudioSource) -> Input {
        match source {
            AudioSource::Local(path) => File::new(path.clone()).into(),
            AudioSource::Stream(info) => {
                HttpRequest::new(self.http_client.clone(), info.stream_url.clone()).into()
            }
        }
    }
}

#[async_trait]
impl VoiceTransport for SongbirdTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> VoiceResult<()> {
        self.manager
            .join(guild_id, channel_id)
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(
                    "Failed to join voice channel {} for guild {}: {}",
                    channel_id, guild_id, e
                );
                VoiceError::JoinFailed(e.to_string())
            })
    }

    async fn disconnect(&self, guild_id: GuildId) -> VoiceResult<()> {
        match self.manager.remove(guild_id).await {
            Ok(()) => Ok(()),
            Err(JoinError::NoCall) => Err(VoiceError::NotConnected),
            Err(e) => Err(VoiceError::JoinFailed(format!(
                "Failed to leave voice channel: {}",
                e
            ))),
        }
    }

    async fn start(&self, guild_id: GuildId, source: &AudioSource) -> VoiceResult<StartedTrack> {
        let call = self.manager.get(guild_id).ok_or(VoiceError::NotConnected)?;
        let input = self.input_for(source);

        let handle = {
            let mut handler = call.lock().await;
            handler.play_input(input)
        };
        info!("Track handle created for: {}", source.describe());

        let (tx, ended) = oneshot::channel();
        let notifier = TrackEndNotifier {
            guild_id,
            tx: Arc::new(Mutex::new(Some(tx))),
        };
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(Event::Track(event), notifier.clone())
                .map_err(|e| VoiceError::Playback(e.to_string()))?;
        }

        Ok(StartedTrack {
            control: Arc::new(handle),
            ended,
        })
    }
}

impl TrackControl for TrackHandle {
    fn pause(&self) -> VoiceResult<()> {
        TrackHandle::pause(self).map_err(|e| VoiceError::Playback(e.to_string()))
    }

    fn resume(&self) -> VoiceResult<()> {
        self.play().map_err(|e| VoiceError::Playback(e.to_string()))
    }

    fn stop(&self) -> VoiceResult<()> {
        TrackHandle::stop(self).map_err(|e| VoiceError::Playback(e.to_string()))
    }
}

/// Forwards the first end or error event of a track to its watcher.
#[derive(Clone)]
struct TrackEndNotifier {
    guild_id: GuildId,
    tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

#[async_trait]
impl EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _) in tracks.iter() {
                debug!("Track in guild {} left with state {:?}", self.guild_id, state.playing);
            }
            let sender = self.tx.lock().ok().and_then(|mut tx| tx.take());
            if let Some(sender) = sender {
                let _ = sender.send(());
            }
        }
        Some(Event::Cancel)
    }
}
