//! Ids shared across the integration tests.

use serenity::model::id::{ChannelId, GuildId, UserId};

pub const BOT_ID: UserId = UserId::new(1_000);
pub const ADMIN_ID: UserId = UserId::new(2_000);
pub const MEMBER_ID: UserId = UserId::new(3_000);

pub const GUILD: GuildId = GuildId::new(10);
pub const OTHER_GUILD: GuildId = GuildId::new(20);

pub const GENERAL_VOICE: ChannelId = ChannelId::new(100);
pub const MUSIC_VOICE: ChannelId = ChannelId::new(200);

/// A playable file name placed in the temporary audio directory.
pub const SONG: &str = "song.mp3";
