/// Time helpers for metric timestamps and log output
use time::macros::format_description;
use time::OffsetDateTime;

/// Current wall-clock time in whole seconds since the Unix epoch
pub fn unix_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Format a Unix timestamp as DD.MM.YYYY - HH:MM:SS (UTC)
///
/// Falls back to the raw number if the timestamp is out of range.
pub fn format_timestamp(timestamp: i64) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| timestamp.to_string())
}
