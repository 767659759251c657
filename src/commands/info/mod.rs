pub(crate) mod serverinfo;
pub(crate) mod userinfo;

use poise::serenity_prelude as serenity;

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(timestamp: serenity::Timestamp) -> String {
    chrono::DateTime::from_timestamp(timestamp.unix_timestamp(), 0)
        .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_utc_seconds() {
        let epoch = serenity::Timestamp::from_unix_timestamp(0).unwrap();
        assert_eq!(format_timestamp(epoch), "1970-01-01 00:00:00");

        let later = serenity::Timestamp::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(format_timestamp(later), "2023-11-14 22:13:20");
    }
}
