use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during voice session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Already disconnected from voice")]
    AlreadyDisconnected,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Failed to join voice channel: {0}")]
    JoinFailed(String),

    #[error("Failed to resolve audio source: {0}")]
    SourceResolutionFailed(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Nothing is currently playing")]
    NotPlaying,

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Failed to reconnect: {0}")]
    ReconnectFailed(String),

    #[error("Audit log unavailable: {0}")]
    AuditLogUnavailable(String),

    #[error("Failed to deliver direct message: {0}")]
    NotificationDeliveryFailed(String),
}

impl VoiceError {
    /// Whether this error is meant to be shown to the invoking user rather
    /// than only logged.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            VoiceError::ReconnectFailed(_)
                | VoiceError::NotificationDeliveryFailed(_)
                | VoiceError::AuditLogUnavailable(_)
        )
    }
}

/// Result type for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;
