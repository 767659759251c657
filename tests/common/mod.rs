//! Shared helpers for the voice integration tests.
#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;

use warden::config::Config;
use warden::voice::{AuditTrail, DirectMessenger, VoiceService};

use fixtures::BOT_ID;
use mocks::FakeTransport;

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("warden=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Configuration with a short leave intent and immediate retries.
pub fn test_config(audio_dir: &Path) -> Config {
    let mut config = Config::default();
    config.voice.audio_dir = audio_dir.to_path_buf();
    config.voice.leave_intent_ttl = Duration::from_secs(10);
    config.reconnect.max_attempts = 1;
    config.reconnect.backoff = Duration::from_millis(100);
    config
}

pub fn service(
    config: &Config,
    transport: Arc<FakeTransport>,
    audit: Arc<dyn AuditTrail>,
    messenger: Arc<dyn DirectMessenger>,
) -> Arc<VoiceService> {
    init_tracing();
    Arc::new(VoiceService::new(config, BOT_ID, transport, audit, messenger))
}

/// Give spawned tasks a chance to run. Under a paused clock the sleep only
/// completes once every other task is blocked.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
