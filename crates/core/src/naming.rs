//! Archive entry naming
//!
//! An archive entry is addressed by its calendar date:
//! `backups/backup-YYYY-MM-DD.json`. ISO dates sort lexicographically in
//! date order, so the greatest valid name is the most recent entry.

use chrono::{Duration, NaiveDate};

/// Archive directory holding the dated documents
pub const BACKUP_DIRECTORY: &str = "backups";

/// File name prefix
pub const BACKUP_FILE_PREFIX: &str = "backup-";

/// File name suffix
pub const BACKUP_FILE_SUFFIX: &str = ".json";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name for a date, e.g. `backup-2026-10-19.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!(
        "{}{}{}",
        BACKUP_FILE_PREFIX,
        date.format(DATE_FORMAT),
        BACKUP_FILE_SUFFIX
    )
}

/// Full archive path for a date under `directory`
pub fn backup_path(directory: &str, date: NaiveDate) -> String {
    let directory = directory.trim_end_matches('/');
    if directory.is_empty() {
        backup_file_name(date)
    } else {
        format!("{}/{}", directory, backup_file_name(date))
    }
}

/// Date embedded in a backup file name, if the name is well-formed
pub fn parse_backup_date(file_name: &str) -> Option<NaiveDate> {
    let date = file_name
        .strip_prefix(BACKUP_FILE_PREFIX)?
        .strip_suffix(BACKUP_FILE_SUFFIX)?;
    // chrono accepts unpadded fields; names must round-trip exactly
    if date.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Parse a `YYYY-MM-DD` date given on the command line
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Whether an entry dated `date` is past the retention window as of `today`
///
/// Entries exactly `retention_days` old are kept; older ones are stale.
/// A window reaching past the earliest representable date expires nothing.
pub fn is_expired(date: NaiveDate, today: NaiveDate, retention_days: u32) -> bool {
    today
        .checked_sub_signed(Duration::days(i64::from(retention_days)))
        .is_some_and(|cutoff| date < cutoff)
}
