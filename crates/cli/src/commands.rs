//! Clap command trees for `kv-backup` and `kv-restore`.

use clap::{Arg, ArgAction, ArgGroup, Command};

/// `kv-backup`
pub fn build_backup_cli() -> Command {
    Command::new("kv-backup")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Export every key in the store and publish it as today's archive entry")
        .after_help(
            "Environment:\n  UPSTASH_REDIS_REST_URL, UPSTASH_REDIS_REST_TOKEN\n  GITHUB_TOKEN, GITHUB_REPO (owner/repo), GITHUB_BRANCH (optional)",
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("PATH")
                .help("Also write the document to a local file"),
        )
        .arg(
            Arg::new("no-publish")
                .long("no-publish")
                .action(ArgAction::SetTrue)
                .requires("output")
                .help("Skip the archive; only write --output"),
        )
        .arg(no_lock_arg())
}

/// `kv-restore`
pub fn build_restore_cli() -> Command {
    Command::new("kv-restore")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Restore the store from a backup document")
        .after_help(
            "Examples:\n  kv-restore backup-2026-10-19.json\n  kv-restore --from-github\n  kv-restore --from-github 2026-10-19\n  kv-restore --list",
        )
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Local backup document"),
        )
        .arg(
            Arg::new("from-github")
                .long("from-github")
                .value_name("DATE|latest")
                .num_args(0..=1)
                .default_missing_value("latest")
                .help("Fetch from the archive: a YYYY-MM-DD date or latest"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .action(ArgAction::SetTrue)
                .help("List archive entries, newest first"),
        )
        .group(
            ArgGroup::new("source")
                .args(["file", "from-github", "list"])
                .required(true)
                .multiple(false),
        )
        .arg(
            Arg::new("yes")
                .long("yes")
                .short('y')
                .action(ArgAction::SetTrue)
                .help("Do not ask for confirmation"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Validate and summarize without writing"),
        )
        .arg(no_lock_arg())
}

fn no_lock_arg() -> Arg {
    Arg::new("no-lock")
        .long("no-lock")
        .action(ArgAction::SetTrue)
        .help("Do not take the store's advisory lock")
}
