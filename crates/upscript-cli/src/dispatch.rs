use anyhow::Result;
use upscript_installer::RuntimeConfig;

use crate::command_flows::{run_fetch_command, run_launch_command, run_update_command};
use crate::render::TerminalRenderer;
use crate::{Cli, Commands};

pub(crate) fn run_cli(cli: Cli, config: &RuntimeConfig) -> Result<i32> {
    match cli.command {
        Commands::Fetch {
            package,
            destination,
            index_url,
        } => {
            let renderer = TerminalRenderer::current();
            run_fetch_command(config, renderer, &package, &destination, &index_url)?;
            Ok(0)
        }
        Commands::Update { destination } => {
            let renderer = TerminalRenderer::current();
            run_update_command(config, renderer, &destination)?;
            Ok(0)
        }
        Commands::Launch {
            environment,
            launcher,
            args,
        } => run_launch_command(config, &environment, &launcher, &args),
    }
}
