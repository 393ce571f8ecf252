// Local crates
use crate::helpers::load_config::Config;
use crate::reporter::reporter;
use crate::runtime::runtime::{ProbeError, run_probe};

// External crates
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "ingest-probe",
    long_about = "ingest-probe is a one-shot diagnostic that pushes a small fixed batch of JSON log \
                  records through an Azure Monitor Data Collection Endpoint to verify that \
                  credentials, endpoint and routing rule are wired correctly.",
    about = "Azure Monitor DCE/DCR ingestion pipeline probe",
    version,
    term_width = 100,
    after_help = "\
    EXAMPLES:
        ingest-probe run --config /etc/ingest_probe.toml
        ingest-probe validate --config ./your_config.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push the sample batch through the configured pipeline
    Run {
        #[arg(short, long, default_value = "/etc/ingest_probe.toml")]
        config: PathBuf,
    },

    /// Validate the configuration file without touching the network
    Validate {
        #[arg(short, long, default_value = "/etc/ingest_probe.toml")]
        config: PathBuf,
    },

    /// Display version information
    Version,
}

/// Entry function for CLI
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run_pipeline(config).await,
        Commands::Validate { config } => validate_config(config),
        Commands::Version => {
            show_version();
            ExitCode::SUCCESS
        }
    }
}

//
// ------------------------ Command Implementations ------------------------------
//

/// Execute the full pipeline and map its outcome onto the process exit code:
/// 0 on success, 1 on any of the three failure tiers.
async fn run_pipeline(config: PathBuf) -> ExitCode {
    match run_probe(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ProbeError::IncompleteConfig(missing)) => {
            reporter::print_missing_fields(&missing);
            ExitCode::FAILURE
        }
        Err(ProbeError::Ingestion(err)) if err.is_api_rejection() => {
            reporter::print_api_failure(&err);
            ExitCode::FAILURE
        }
        Err(err) => {
            reporter::print_generic_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Validate configuration file
fn validate_config(config: PathBuf) -> ExitCode {
    println!("Validating configuration file: {:?}", config);
    match Config::load(&config) {
        Ok(cfg) => {
            let missing = cfg.missing_fields();
            if missing.is_empty() {
                println!("Configuration valid");
                ExitCode::SUCCESS
            } else {
                reporter::print_missing_fields(&missing);
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            reporter::print_generic_failure(&err);
            ExitCode::FAILURE
        }
    }
}

/// Show version information
fn show_version() {
    println!("ingest-probe {}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["ingest-probe"]).is_err());
    }

    #[test]
    fn cli_parses_run_with_config_path() {
        let cli = Cli::try_parse_from(["ingest-probe", "run", "--config", "probe.toml"]).unwrap();
        match cli.command {
            Commands::Run { config } => assert_eq!(config, PathBuf::from("probe.toml")),
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn cli_parses_validate_with_default_config_path() {
        let cli = Cli::try_parse_from(["ingest-probe", "validate"]).unwrap();
        match cli.command {
            Commands::Validate { config } => {
                assert_eq!(config, PathBuf::from("/etc/ingest_probe.toml"));
            }
            _ => panic!("expected validate subcommand"),
        }
    }
}
