//! The `pipit` binary: parses arguments, loads configuration, checks the
//! requested files, and exits with a status reflecting whether any errors
//! were reported -- the same contract the teacher's own CLI driver follows.

use clap::Parser;
use pipit::{args, config, logging, run};

fn main() -> anyhow::Result<()> {
    let cli = args::Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = config::Config::load(cli.config.as_deref())?;
    let summary = run::run(&cli.paths, &config);

    tracing::info!(
        files = summary.files_checked,
        diagnostics = summary.diagnostic_count,
        errors = summary.error_count,
        "check complete"
    );

    if summary.error_count > 0 && !cli.exit_zero {
        std::process::exit(1);
    }

    Ok(())
}
