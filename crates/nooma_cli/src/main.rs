//! Command-line probe for a Nooma database.
//!
//! # Responsibility
//! - Resolve configuration from the environment and open the database.
//! - Print the dashboard snapshot as JSON for quick local inspection.
//!
//! Usage: `nooma_cli [dashboard|ping|version]` (default `dashboard`).

use log::error;
use nooma_core::{AppConfig, DashboardService};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let command = std::env::args().nth(1);
    let result = match command.as_deref() {
        None | Some("dashboard") => print_dashboard(),
        Some("ping") => {
            println!("nooma_core ping={}", nooma_core::ping());
            Ok(())
        }
        Some("version") => {
            println!("nooma_core version={}", nooma_core::core_version());
            Ok(())
        }
        Some(other) => {
            Err(format!("unknown command `{other}`; expected dashboard|ping|version").into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_dashboard() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    nooma_core::init_from_config(&config)?;

    let conn = nooma_core::open_db(&config.db_path)?;
    let snapshot = DashboardService::try_new(&conn)?.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
