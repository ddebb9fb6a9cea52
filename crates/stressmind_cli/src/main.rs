//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open `stressmind_core` from the environment-resolved configuration.
//! - Print version, storage location and the plain-text data export.

use std::process::ExitCode;
use stressmind_core::{CoreConfig, WellbeingService};

fn main() -> ExitCode {
    println!("stressmind_core ping={}", stressmind_core::ping());
    println!("stressmind_core version={}", stressmind_core::core_version());

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::from(2);
        }
    };
    println!("data_dir={}", config.data_dir.display());

    if let Err(err) =
        stressmind_core::init_logging(config.log_level, &config.log_dir().to_string_lossy())
    {
        eprintln!("logging disabled: {err}");
    }

    let service = match WellbeingService::open(&config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("open failed ({}): {err}", err.kind());
            return ExitCode::FAILURE;
        }
    };
    for issue in service.load_issues() {
        eprintln!("load issue slot={} kind={}: {}", issue.slot, issue.kind, issue.message);
    }

    print!("{}", service.export_all_data());
    ExitCode::SUCCESS
}
