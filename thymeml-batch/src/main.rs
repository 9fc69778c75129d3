use std::process::ExitCode;

use clap::Parser;
use thymeml_batch::{BatchConfig, BatchRunner, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut config = match BatchConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    let report = match BatchRunner::new(config).run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", report);
    }

    ExitCode::from(report.summary.exit_code(cli.fail_on_conflict))
}
