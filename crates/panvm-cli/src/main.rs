mod completion;
mod config;
mod dispatch;
mod prompt;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::completion::CliCompletionShell;

/// Filter directives for diagnostics on stderr, in `EnvFilter` syntax.
const LOG_ENV: &str = "PANVM_LOG";

#[derive(Parser, Debug)]
#[command(name = "panvm", version)]
#[command(about = "Install and switch between pandoc releases", long_about = None)]
struct Cli {
    /// Data root holding installed versions and config.toml.
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a release; defaults to the newest one.
    Install {
        version: Option<String>,
        #[arg(long)]
        force: bool,
    },
    /// Install the bundle from a recent successful nightly build.
    Nightly {
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        n_last: u64,
    },
    Uninstall {
        version: String,
    },
    /// List installed versions, marking the active one.
    List,
    /// List releases that can be installed on this host.
    Available,
    /// Make a version the default for future runs.
    Use {
        version: String,
    },
    /// Print the path of a version's pandoc executable.
    Which {
        version: Option<String>,
    },
    /// Run pandoc, forwarding every argument after `--`.
    Run {
        #[arg(long = "use", value_name = "VERSION")]
        use_version: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Save the release catalog to a JSON file for offline use.
    Snapshot {
        path: PathBuf,
    },
    Doctor,
    Completions {
        #[arg(value_enum)]
        shell: CliCompletionShell,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,panvm=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn,panvm=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    dispatch::run_cli(cli)
}

#[cfg(test)]
mod tests;
