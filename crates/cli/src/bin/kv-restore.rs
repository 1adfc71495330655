//! kv-restore: rebuild the store from a local or archived backup.

use std::process;

use kvsnap_cli::commands::build_restore_cli;
use kvsnap_cli::logging;
use kvsnap_cli::parse::restore_action;
use kvsnap_cli::run::{restore_main, EXIT_FAILURE};

#[tokio::main]
async fn main() {
    let matches = build_restore_cli().get_matches();
    logging::init();

    let code = match restore_action(&matches) {
        Ok(action) => restore_main(action).await,
        Err(e) => {
            eprintln!("(error) {}", e);
            EXIT_FAILURE
        }
    };
    process::exit(code);
}
