// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rentri` - command-line client for the RENTRI waste-document registry.

mod batch;
mod documents;
mod issue;
mod prompt;
mod session;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rentri_config::RentriConfig;
use rentri_core::RentriError;

/// Command-line client for the RENTRI waste-document registry.
#[derive(Parser, Debug)]
#[command(name = "rentri", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the issuance blocks of the configured operator.
    Blocks,
    /// List the documents of a block, or of every block when none is given.
    Documents {
        block: Option<String>,
        /// Case-insensitive match on tracking number, block code and sequence.
        #[arg(long)]
        search: Option<String>,
        /// Only show documents in this state (issued, voided).
        #[arg(long)]
        status: Option<String>,
        /// Print the raw records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Issue documents in a block and download the new ones.
    Issue {
        block: String,
        #[arg(long, short = 'n')]
        count: usize,
        /// Destination directory (defaults to `workflow.output_dir`).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Download the rendered files of existing documents.
    Download {
        block: String,
        #[arg(required = true)]
        sequences: Vec<u64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Void issued documents.
    Void {
        block: String,
        #[arg(required = true)]
        sequences: Vec<u64>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Look up a document by tracking number.
    Verify { tracking: String },
    /// Probe the service endpoint and its sub-services.
    Status {
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => rentri_config::load_and_validate_path(path),
        None => rentri_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            rentri_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: RentriConfig) -> Result<(), RentriError> {
    match command {
        Commands::Blocks => documents::run_blocks(&config).await,
        Commands::Documents {
            block,
            search,
            status,
            json,
        } => {
            let filter = documents::DocumentFilter::new(search.as_deref(), status.as_deref())?;
            documents::run_documents(&config, block.as_deref(), &filter, json).await
        }
        Commands::Issue { block, count, out } => {
            let out = out.unwrap_or_else(|| PathBuf::from(&config.workflow.output_dir));
            issue::run_issue(&config, &block, count, out).await
        }
        Commands::Download {
            block,
            sequences,
            out,
        } => {
            let out = out.unwrap_or_else(|| PathBuf::from(&config.workflow.output_dir));
            batch::run_download(&config, &block, &sequences, &out).await
        }
        Commands::Void {
            block,
            sequences,
            yes,
        } => batch::run_void(&config, &block, &sequences, yes).await,
        Commands::Verify { tracking } => documents::run_verify(&config, &tracking).await,
        Commands::Status { json, plain } => status::run_status(&config, json, plain).await,
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides `logging.level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rentri={log_level},rentri_client={log_level},rentri_worker={log_level},\
             rentri_auth={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["rentri", "status", "--config", "/tmp/r.toml", "--plain"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/r.toml")));
        assert!(matches!(
            cli.command,
            Commands::Status {
                json: false,
                plain: true
            }
        ));
    }

    #[test]
    fn void_requires_sequences() {
        assert!(Cli::try_parse_from(["rentri", "void", "B1"]).is_err());
        let cli = Cli::try_parse_from(["rentri", "void", "B1", "3", "4", "--yes"]).unwrap();
        match cli.command {
            Commands::Void {
                block,
                sequences,
                yes,
            } => {
                assert_eq!(block, "B1");
                assert_eq!(sequences, vec![3, 4]);
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn documents_block_is_optional() {
        let cli = Cli::try_parse_from(["rentri", "documents", "--status", "voided"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Documents { block: None, .. }
        ));

        let cli = Cli::try_parse_from(["rentri", "documents", "B7"]).unwrap();
        match cli.command {
            Commands::Documents { block, .. } => assert_eq!(block.as_deref(), Some("B7")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn issue_takes_count() {
        let cli = Cli::try_parse_from(["rentri", "issue", "B1", "-n", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Issue { count: 5, out: None, .. }
        ));
    }
}
