//! This module aggregates all the command modules for the bot.

/// Administrator-only moderation commands (kick, ban, timeouts, mutes).
pub(crate) mod admins;
/// General purpose commands (ping, poll).
pub(crate) mod general;
/// Informational embeds about members and the server.
pub(crate) mod info;
/// Voice session commands (join, leave, playback).
pub(crate) mod voice;
