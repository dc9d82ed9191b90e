use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use upscript_installer::RuntimeConfig;

mod command_flows;
mod dispatch;
mod exit_code;
mod render;

use command_flows::DEFAULT_INDEX_URL;
use dispatch::run_cli;
use exit_code::{exit_code_for_error, exit_status_byte, usage_exit_code};
use render::{current_output_style, render_error_lines};

const LOG_ENV: &str = "UPSCRIPT_LOG";

#[derive(Parser, Debug)]
#[command(name = "upscript", version)]
#[command(about = "Self-updating command launchers for Python packages", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an environment at <DESTINATION>/.files, install a package into
    /// it and write a launcher for each of its commands into <DESTINATION>.
    Fetch {
        package: String,
        destination: PathBuf,
        #[arg(long, default_value = DEFAULT_INDEX_URL)]
        index_url: String,
    },
    /// Check the index now and refresh packages and launchers.
    Update { destination: PathBuf },
    /// Entry point used by generated launchers.
    #[command(hide = true)]
    Launch {
        #[arg(long)]
        environment: PathBuf,
        launcher: PathBuf,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(usage_exit_code(&err));
        }
    };
    init_tracing(cli.verbose);

    let result = RuntimeConfig::from_env().and_then(|config| run_cli(cli, &config));
    match result {
        Ok(code) => ExitCode::from(exit_status_byte(code)),
        Err(err) => {
            for line in render_error_lines(current_output_style(), &err) {
                eprintln!("{line}");
            }
            ExitCode::from(exit_code_for_error(&err))
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        format!("upscript_cli={level},upscript_installer={level},upscript_index={level}")
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests;
