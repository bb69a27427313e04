//! Command-line argument parsing (clap derive), grounded in the teacher's
//! own CLI shape: a set of paths to check plus a handful of global flags,
//! not a git-style subcommand tree -- this tool does one thing.

use camino::Utf8PathBuf;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "pipit", version, about = "A gradual type checker")]
pub struct Cli {
    /// Files or directories to check. Defaults to the current directory.
    pub paths: Vec<Utf8PathBuf>,

    /// Path to a `pipit.toml` configuration file; defaults to looking for
    /// one in the current directory.
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Exit with status 0 even if diagnostics were reported.
    #[arg(long)]
    pub exit_zero: bool,

    /// Increase log verbosity; can be passed multiple times.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except diagnostics and a final error summary.
    #[arg(short, long)]
    pub quiet: bool,
}
