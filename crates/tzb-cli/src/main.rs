//! The `tzb` command.

mod cli;
mod commands;
mod logging;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let settings = cli.settings.as_deref();

    match cli.command {
        Commands::Build {
            run,
            skip_validation,
            skip_oceans,
            no_cache,
            json,
        } => commands::build::run(commands::build::Args {
            config: support::run_config_or_exit(settings, &run),
            skip_validation,
            skip_oceans,
            no_cache,
            json,
        }),

        Commands::Validate { run, json } => {
            commands::validate::run(support::run_config_or_exit(settings, &run), json)
        }

        Commands::Diff {
            run,
            previous_release,
            json,
        } => commands::diff::run(support::run_config_or_exit(settings, &run), previous_release, json),

        Commands::Lint { run, json } => commands::lint::run(support::run_config_or_exit(settings, &run), json),

        Commands::Queries { run, json } => {
            commands::queries::run(support::run_config_or_exit(settings, &run), json)
        }

        Commands::Names { run } => commands::names::run(support::run_config_or_exit(settings, &run)),
    }
}
