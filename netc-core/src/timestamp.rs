//! Campaign and record timestamps.
//!
//! `YYYY-MM-DD HH:MM:SS` in local time, so names built from them sort chronologically.
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub fn now() -> String {
    // Local offset lookup can fail once other threads exist; UTC still sorts.
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format(now)
}

pub fn format(at: OffsetDateTime) -> String {
    at.format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}
