//! Test doubles for the voice seams.
//!
//! The transport is a hand-written fake because tests need to drive track
//! ends themselves. The audit log and DM seams use mockall.

use mockall::mock;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, oneshot};

use warden::voice::{
    AudioSource, AuditTrail, DirectMessenger, DisconnectEntry, StartedTrack, TrackControl,
    VoiceError, VoiceResult, VoiceTransport,
};

/// A track handed to [`FakeTransport`].
pub struct FakeTrack {
    pub source: AudioSource,
    ended: Mutex<Option<oneshot::Sender<()>>>,
    paused: AtomicBool,
    stops: AtomicUsize,
    end_on_stop: bool,
}

impl FakeTrack {
    /// Run the track out as if the audio ended on its own.
    pub fn finish(&self) {
        if let Some(tx) = self.ended.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl TrackControl for FakeTrack {
    fn pause(&self) -> VoiceResult<()> {
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&self) -> VoiceResult<()> {
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> VoiceResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        // stopping ends the track, same as the real driver
        if self.end_on_stop {
            self.finish();
        }
        Ok(())
    }
}

/// Records every call and lets tests decide whether connects succeed.
#[derive(Default)]
pub struct FakeTransport {
    pub connects: Mutex<Vec<(GuildId, ChannelId)>>,
    pub disconnects: Mutex<Vec<GuildId>>,
    pub tracks: Mutex<Vec<Arc<FakeTrack>>>,
    fail_connects: AtomicBool,
    not_connected: AtomicBool,
    connect_gate: Mutex<Option<Arc<Notify>>>,
    late_ends: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_connects(&self, fail: bool) {
        self.fail_connects.store(fail, Ordering::SeqCst);
    }

    /// Park every later `connect` until the returned gate is notified.
    pub fn hold_connects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.connect_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Tracks started from now on only report their end through
    /// [`FakeTrack::finish`], even when stopped.
    pub fn deliver_ends_late(&self) {
        self.late_ends.store(true, Ordering::SeqCst);
    }

    /// Make `disconnect` report that no call exists.
    pub fn lose_call(&self) {
        self.not_connected.store(true, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> Vec<(GuildId, ChannelId)> {
        self.connects.lock().unwrap().clone()
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnects.lock().unwrap().len()
    }

    pub fn track(&self, index: usize) -> Arc<FakeTrack> {
        Arc::clone(&self.tracks.lock().unwrap()[index])
    }

    pub fn track_count(&self) -> usize {
        self.tracks.lock().unwrap().len()
    }
}

#[async_trait]
impl VoiceTransport for FakeTransport {
    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> VoiceResult<()> {
        self.connects.lock().unwrap().push((guild_id, channel_id));
        let gate = self.connect_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_connects.load(Ordering::SeqCst) {
            return Err(VoiceError::JoinFailed("gateway timed out".into()));
        }
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> VoiceResult<()> {
        self.disconnects.lock().unwrap().push(guild_id);
        if self.not_connected.load(Ordering::SeqCst) {
            return Err(VoiceError::NotConnected);
        }
        Ok(())
    }

    async fn start(&self, _guild_id: GuildId, source: &AudioSource) -> VoiceResult<StartedTrack> {
        let (tx, rx) = oneshot::channel();
        let track = Arc::new(FakeTrack {
            source: source.clone(),
            ended: Mutex::new(Some(tx)),
            paused: AtomicBool::new(false),
            stops: AtomicUsize::new(0),
            end_on_stop: !self.late_ends.load(Ordering::SeqCst),
        });
        self.tracks.lock().unwrap().push(Arc::clone(&track));
        Ok(StartedTrack {
            control: track,
            ended: rx,
        })
    }
}

mock! {
    pub Audit {}

    #[async_trait]
    impl AuditTrail for Audit {
        async fn latest_member_disconnect(&self, guild_id: GuildId) -> VoiceResult<Option<DisconnectEntry>>;
    }
}

mock! {
    pub Messenger {}

    #[async_trait]
    impl DirectMessenger for Messenger {
        async fn direct_message(&self, user_id: UserId, content: &str) -> VoiceResult<()>;
    }
}

/// An audit log whose latest entry is `entry`.
pub fn audit_with(entry: Option<DisconnectEntry>) -> Arc<MockAudit> {
    let mut audit = MockAudit::new();
    audit
        .expect_latest_member_disconnect()
        .returning(move |_| Ok(entry.clone()));
    Arc::new(audit)
}

/// An audit log the supervisor must never consult.
pub fn untouched_audit() -> Arc<MockAudit> {
    let mut audit = MockAudit::new();
    audit.expect_latest_member_disconnect().never();
    Arc::new(audit)
}

pub fn silent_messenger() -> Arc<MockMessenger> {
    let mut messenger = MockMessenger::new();
    messenger.expect_direct_message().never();
    Arc::new(messenger)
}

/// A messenger that expects exactly one DM to `user_id`.
pub fn messenger_expecting(user_id: UserId) -> Arc<MockMessenger> {
    let mut messenger = MockMessenger::new();
    messenger
        .expect_direct_message()
        .withf(move |user, _| *user == user_id)
        .times(1)
        .returning(|_, _| Ok(()));
    Arc::new(messenger)
}

pub fn admin_disconnected_bot(actor_id: UserId) -> DisconnectEntry {
    DisconnectEntry {
        target_id: None,
        actor_id,
        actor_is_admin: true,
    }
}
