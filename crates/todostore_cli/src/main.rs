//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `todostore_core` linkage and environment configuration.
//! - Offer a read-only peek at one partition for local sanity checks.
//!
//! Usage: `todostore [OWNER]`. An empty OWNER (`""`) lists the global index.

use log::info;
use std::process::ExitCode;
use todostore_core::{core_version, init_from_config, Storage, StoreConfig, TodoRepository};

fn main() -> ExitCode {
    println!("todostore_core version={}", core_version());

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("todostore: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(owner: Option<String>) -> Result<(), String> {
    let config = StoreConfig::from_env().map_err(|err| err.to_string())?;
    if init_from_config(&config)? {
        info!("event=cli_start module=cli status=ok");
    }

    let Some(owner) = owner else {
        return Ok(());
    };

    let storage = Storage::from_config(&config).map_err(|err| err.to_string())?;
    let listed = storage.todos().list_todos(&owner).map_err(|err| err.to_string());
    storage.close().map_err(|err| err.to_string())?;

    for item in listed? {
        println!(
            "{} rank={} due={} title={}",
            item.id, item.rank, item.due_date, item.title
        );
    }
    Ok(())
}
