use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;
use warden::voice::{AudioSource, VoiceError};

const SUCCESS: u32 = 0x00ff00;
const FAILURE: u32 = 0xff0000;

/// User-facing wording for a voice error.
pub fn describe_error(err: &VoiceError) -> String {
    match err {
        VoiceError::NotInGuild => "This command only works in a server.".to_string(),
        VoiceError::NotConnected => "Bot is not connected to a voice channel.".to_string(),
        VoiceError::AlreadyDisconnected => "I'm not connected to a voice channel.".to_string(),
        VoiceError::UserNotInVoiceChannel => "You need to join a voice channel first.".to_string(),
        VoiceError::FileNotFound(_) => "File not found in bot directory.".to_string(),
        VoiceError::SourceResolutionFailed(_) => {
            "Error fetching the audio from the provided link.".to_string()
        }
        VoiceError::NotPlaying => "No music is currently playing.".to_string(),
        // internal failures are logged where they happen
        other if !other.is_user_facing() => {
            "Something went wrong with the voice connection.".to_string()
        }
        other => other.to_string(),
    }
}

pub fn error(err: &VoiceError) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(describe_error(err))
                .color(FAILURE),
        )
        .ephemeral(true)
}

fn success(title: &str, description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(SUCCESS),
    )
}

pub fn joined(channel_name: &str) -> CreateReply {
    success("🔊 Joined", format!("Joined {}", channel_name))
}

pub fn left() -> CreateReply {
    success("👋 Left", "Disconnected from voice channel.")
}

pub fn now_playing(source: &AudioSource) -> CreateReply {
    let description = match source {
        AudioSource::Local(_) => source.describe(),
        AudioSource::Stream(info) => format!("[{}]({})", info.title, info.page_url),
    };
    success("🎵 Now Playing", description)
}

pub fn skipped() -> CreateReply {
    success("⏭️ Skipped", "Music has been skipped.")
}

pub fn paused() -> CreateReply {
    success("⏸️ Paused", "Music has been paused.")
}

pub fn resumed() -> CreateReply {
    success("▶️ Resumed", "Music has been resumed.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use test_case::test_case;

    #[test_case(VoiceError::NotConnected, "Bot is not connected to a voice channel." ; "not connected")]
    #[test_case(VoiceError::AlreadyDisconnected, "I'm not connected to a voice channel." ; "already disconnected")]
    #[test_case(VoiceError::FileNotFound(PathBuf::from("a.mp3")), "File not found in bot directory." ; "file not found")]
    #[test_case(VoiceError::SourceResolutionFailed("403".into()), "Error fetching the audio from the provided link." ; "resolution failed")]
    #[test_case(VoiceError::NotPlaying, "No music is currently playing." ; "not playing")]
    #[test_case(VoiceError::JoinFailed("timeout".into()), "Failed to join voice channel: timeout" ; "falls back to display")]
    #[test_case(VoiceError::ReconnectFailed("gateway".into()), "Something went wrong with the voice connection." ; "internal errors stay vague")]
    fn error_wording(err: VoiceError, expected: &str) {
        assert_eq!(describe_error(&err), expected);
    }
}
