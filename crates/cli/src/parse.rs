//! ArgMatches → run settings.
//!
//! - `kv-backup` → [`BackupArgs`]
//! - `kv-restore` → [`RestoreAction`]

use std::path::PathBuf;

use clap::ArgMatches;
use kvsnap_core::naming::parse_date;
use kvsnap_engine::{ArchiveSelector, BackupSource};

/// Parsed `kv-backup` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArgs {
    /// Local copy of the document.
    pub output: Option<PathBuf>,
    /// Publish to the archive.
    pub publish: bool,
    /// Hold the advisory lock.
    pub lock: bool,
}

/// What `kv-restore` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreAction {
    /// List archive entries.
    List,
    /// Restore from a source.
    Restore {
        source: BackupSource,
        yes: bool,
        dry_run: bool,
        lock: bool,
    },
}

impl RestoreAction {
    /// Whether the action talks to the archive.
    pub fn needs_archive(&self) -> bool {
        match self {
            RestoreAction::List => true,
            RestoreAction::Restore { source, .. } => matches!(source, BackupSource::Archive(_)),
        }
    }
}

/// Convert `kv-backup` matches.
pub fn backup_args(matches: &ArgMatches) -> Result<BackupArgs, String> {
    let output = matches.get_one::<String>("output").map(PathBuf::from);
    let publish = !matches.get_flag("no-publish");
    if !publish && output.is_none() {
        return Err("--no-publish needs --output".to_string());
    }
    Ok(BackupArgs {
        output,
        publish,
        lock: !matches.get_flag("no-lock"),
    })
}

/// Convert `kv-restore` matches.
pub fn restore_action(matches: &ArgMatches) -> Result<RestoreAction, String> {
    if matches.get_flag("list") {
        return Ok(RestoreAction::List);
    }

    let source = if let Some(file) = matches.get_one::<String>("file") {
        BackupSource::LocalFile(PathBuf::from(file))
    } else if let Some(selector) = matches.get_one::<String>("from-github") {
        BackupSource::Archive(parse_selector(selector)?)
    } else {
        return Err("Give a backup file, --from-github [DATE|latest] or --list".to_string());
    };

    Ok(RestoreAction::Restore {
        source,
        yes: matches.get_flag("yes"),
        dry_run: matches.get_flag("dry-run"),
        lock: !matches.get_flag("no-lock"),
    })
}

/// `latest` or a `YYYY-MM-DD` date.
pub fn parse_selector(text: &str) -> Result<ArchiveSelector, String> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("latest") {
        return Ok(ArchiveSelector::Latest);
    }
    parse_date(text)
        .map(ArchiveSelector::Date)
        .ok_or_else(|| format!("Expected YYYY-MM-DD or latest, got {:?}", text))
}
