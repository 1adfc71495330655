//! Run orchestration and exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success, or the operator declined a restore |
//! | 1 | configuration, enumeration, publish, fetch or validation failure |
//! | 2 | restore finished with per-key failures |

use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use kvsnap_archive::RemoteArchive;
use kvsnap_engine::{
    list_backups, AutoConfirm, Confirmation, ExportOptions, ExportReport, Exporter, PruneReport,
    PublishOptions, PublishReceipt, Publisher, RestoreLoader, RestoreOptions, RestoreOutcome,
};
use kvsnap_store::{AdvisoryLock, KeyValueStore, LockOptions};
use tracing::{error, info, warn};

use crate::config::{ArchiveConfig, StoreConfig};
use crate::parse::{BackupArgs, RestoreAction};
use crate::prompt::InteractiveConfirm;

/// Success, or a declined restore
pub const EXIT_OK: i32 = 0;
/// The run failed before or instead of completing
pub const EXIT_FAILURE: i32 = 1;
/// Restore completed with per-key failures
pub const EXIT_PARTIAL: i32 = 2;

/// What a backup run produced
#[derive(Debug)]
pub struct BackupOutcome {
    /// Export counts
    pub report: ExportReport,
    /// Archive entry written, unless publishing was skipped
    pub receipt: Option<PublishReceipt>,
    /// Retention pass, if it ran
    pub prune: Option<PruneReport>,
}

/// Export the store, write and publish the document, then prune
///
/// `archive` must be given when `args.publish` is set.
pub async fn backup<S: KeyValueStore + ?Sized>(
    store: &S,
    archive: Option<&dyn RemoteArchive>,
    args: &BackupArgs,
    now: DateTime<Utc>,
) -> anyhow::Result<BackupOutcome> {
    let archive = match (args.publish, archive) {
        (true, Some(archive)) => Some(archive),
        (true, None) => bail!("publishing requested but no archive is configured"),
        (false, _) => None,
    };

    let lock = if args.lock {
        Some(
            AdvisoryLock::acquire(store, &LockOptions::default())
                .await
                .context("cannot start backup")?,
        )
    } else {
        None
    };

    let result = export_and_publish(store, archive, args.output.as_deref(), now).await;

    if let Some(lock) = lock {
        if let Err(e) = lock.release(store).await {
            warn!(error = %e, "failed to release store lock");
        }
    }
    result
}

async fn export_and_publish<S: KeyValueStore + ?Sized>(
    store: &S,
    archive: Option<&dyn RemoteArchive>,
    output: Option<&Path>,
    now: DateTime<Utc>,
) -> anyhow::Result<BackupOutcome> {
    let (document, report) = Exporter::new(store, ExportOptions::default())
        .export(now)
        .await?;
    info!("{}", report.summary());

    if let Some(path) = output {
        let json = document.to_json_pretty()?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        info!(path = %path.display(), "wrote local copy");
    }

    let Some(archive) = archive else {
        return Ok(BackupOutcome {
            report,
            receipt: None,
            prune: None,
        });
    };

    let publisher = Publisher::new(archive, PublishOptions::default());
    let today = now.date_naive();
    let receipt = publisher
        .publish(&document, today)
        .await
        .context("backup was exported but not published")?;

    // Publishing succeeded; a failed listing only postpones pruning
    let prune = match publisher.prune(today).await {
        Ok(prune) => {
            info!("{}", prune.summary());
            Some(prune)
        }
        Err(e) => {
            warn!(error = %e, "could not list archive for pruning");
            None
        }
    };

    Ok(BackupOutcome {
        report,
        receipt: Some(receipt),
        prune,
    })
}

/// Exit code for a finished restore
pub fn restore_exit_code(outcome: &RestoreOutcome) -> i32 {
    match outcome {
        RestoreOutcome::Completed { report, .. } if report.has_failures() => EXIT_PARTIAL,
        _ => EXIT_OK,
    }
}

fn print_outcome(outcome: &RestoreOutcome) {
    match outcome {
        RestoreOutcome::Planned(plan) => {
            println!("{plan}");
            println!("Dry run: nothing was written.");
        }
        RestoreOutcome::Declined(_) => println!("Restore cancelled."),
        RestoreOutcome::Completed { report, .. } => {
            println!("{}", report.summary());
            for failure in &report.failures {
                println!("  failed: {} ({})", failure.key, failure.reason);
            }
        }
    }
}

/// `kv-backup` entry point
pub async fn backup_main(args: BackupArgs) -> i32 {
    match backup_from_env(&args).await {
        Ok(outcome) => {
            if let Some(receipt) = &outcome.receipt {
                println!("Published {} ({} bytes)", receipt.path, receipt.bytes);
            }
            EXIT_OK
        }
        Err(e) => {
            error!("{:#}", e);
            EXIT_FAILURE
        }
    }
}

async fn backup_from_env(args: &BackupArgs) -> anyhow::Result<BackupOutcome> {
    let store = StoreConfig::from_env()?.connect()?;
    let archive = if args.publish {
        Some(ArchiveConfig::from_env()?.connect()?)
    } else {
        None
    };
    backup(
        &store,
        archive.as_ref().map(|a| a as &dyn RemoteArchive),
        args,
        Utc::now(),
    )
    .await
}

/// `kv-restore` entry point
pub async fn restore_main(action: RestoreAction) -> i32 {
    match restore_from_env(action).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            EXIT_FAILURE
        }
    }
}

async fn restore_from_env(action: RestoreAction) -> anyhow::Result<i32> {
    // Check every variable the action needs before any I/O
    let archive_config = if action.needs_archive() {
        Some(ArchiveConfig::from_env()?)
    } else {
        None
    };
    let store_config = match action {
        RestoreAction::List => None,
        RestoreAction::Restore { .. } => Some(StoreConfig::from_env()?),
    };
    let archive = archive_config.as_ref().map(ArchiveConfig::connect).transpose()?;

    let (source, yes, dry_run, lock) = match action {
        RestoreAction::List => {
            let Some(archive) = archive.as_ref() else {
                bail!("listing needs the archive");
            };
            let listings = list_backups(archive, &RestoreOptions::default().directory).await?;
            if listings.is_empty() {
                println!("No backups found.");
            }
            for listing in listings {
                println!("{}  {}", listing.date, listing.path);
            }
            return Ok(EXIT_OK);
        }
        RestoreAction::Restore {
            source,
            yes,
            dry_run,
            lock,
        } => (source, yes, dry_run, lock),
    };

    let Some(store_config) = store_config else {
        bail!("restore needs the store");
    };
    let store = store_config.connect()?;

    let options = RestoreOptions::new()
        .dry_run(dry_run)
        .lock(lock.then(LockOptions::default));
    let mut loader = RestoreLoader::new(&store, options);
    if let Some(archive) = archive.as_ref() {
        loader = loader.with_archive(archive);
    }

    let mut confirmation: Box<dyn Confirmation> = if yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(InteractiveConfirm)
    };
    let outcome = loader.run(&source, confirmation.as_mut()).await?;
    print_outcome(&outcome);
    Ok(restore_exit_code(&outcome))
}
