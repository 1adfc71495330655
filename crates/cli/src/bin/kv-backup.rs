//! kv-backup: export the store and publish today's archive entry.

use std::process;

use kvsnap_cli::commands::build_backup_cli;
use kvsnap_cli::logging;
use kvsnap_cli::parse::backup_args;
use kvsnap_cli::run::{backup_main, EXIT_FAILURE};

#[tokio::main]
async fn main() {
    let matches = build_backup_cli().get_matches();
    logging::init();

    let code = match backup_args(&matches) {
        Ok(args) => backup_main(args).await,
        Err(e) => {
            eprintln!("(error) {}", e);
            EXIT_FAILURE
        }
    };
    process::exit(code);
}
