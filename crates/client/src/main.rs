//! `rps`: move attestation proofs from the command line.
//!
//! ```bash
//! rps setup --seed 7                      # write <key-dir>/<circuit>.{zkey,vkey}
//! rps attest paper --nonce 0              # commit to a move and prove it is valid
//! rps reveal 0x2f…  --nonce 0             # open the commitment
//! rps prove attestValidMove input.json    # raw circuit input
//! rps verify proof.json
//! ```
//!
//! Configuration comes from `RPS_*` environment variables (a `.env` file is
//! honoured) and can be overridden per invocation with the global flags.

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use runtime::RuntimeConfig;
use zk::BackendKind;

use commands::{Attest, Prove, Reveal, Setup, Verify, Witness};

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "Zero-knowledge proofs for rock/paper/scissors moves", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding `<circuit>.zkey` / `<circuit>.vkey`
    #[arg(long, global = true)]
    pub key_dir: Option<PathBuf>,

    /// Proving backend (`file-path`, `in-memory`, `bridged`)
    #[arg(long, global = true)]
    pub backend: Option<BackendKind>,

    /// Check every constraint while computing the witness
    #[arg(long, global = true)]
    pub sanity_check: bool,

    /// Also write each proof as JSON into this directory
    #[arg(long, global = true)]
    pub save_proofs_dir: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Environment configuration with command-line overrides applied.
    pub fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::from_env();
        if let Some(dir) = &self.key_dir {
            config.key_dir = dir.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if self.sanity_check {
            config.sanity_check = true;
        }
        if let Some(dir) = &self.save_proofs_dir {
            config.save_proofs_dir = Some(dir.clone());
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate proving and verifying keys
    Setup(Setup),

    /// Compute a witness from circuit input JSON
    Witness(Witness),

    /// Prove circuit input JSON
    Prove(Prove),

    /// Verify a proof JSON file
    Verify(Verify),

    /// Commit to a move and prove it is valid
    Attest(Attest),

    /// Open a move commitment
    Reveal(Reveal),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::setup_logging(cli.global.verbose)?;
    let config = cli.global.runtime_config();

    match cli.command {
        Command::Setup(cmd) => cmd.execute(&config),
        Command::Witness(cmd) => cmd.execute(&config),
        Command::Prove(cmd) => cmd.execute(config).await,
        Command::Verify(cmd) => cmd.execute(&config),
        Command::Attest(cmd) => cmd.execute(config).await,
        Command::Reveal(cmd) => cmd.execute(config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "rps",
            "attest",
            "rock",
            "--nonce",
            "3",
            "--seed",
            "dev",
            "--backend",
            "bridged",
            "--key-dir",
            "/tmp/keys",
        ])
        .expect("parses");

        assert_eq!(cli.global.backend, Some(BackendKind::Bridged));
        let config = cli.global.runtime_config();
        assert_eq!(config.backend, BackendKind::Bridged);
        assert_eq!(config.key_dir, PathBuf::from("/tmp/keys"));
        assert!(matches!(cli.command, Command::Attest(_)));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["rps", "setup", "--backend", "gpu"]).is_err());
    }
}
