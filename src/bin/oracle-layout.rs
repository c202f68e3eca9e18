use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use oracle_layout::{
    bin_utils::{Command, Service, load_registry, parse_account_data},
    config::{DEFAULT_PROGRAM_ID, OracleConfig},
    identifier::Identifier,
    instruction::InstructionEncoder,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "oracle-layout")]
#[command(about = "Build mock oracle instructions and decode oracle accounts")]
struct Args {
    /// Symbol registry in CSV format.
    #[arg(short, long, default_value = "registry/renec-testnet.csv", env = "ORACLE_REGISTRY")]
    registry: PathBuf,

    /// Mock oracle program id.
    #[arg(long, default_value = DEFAULT_PROGRAM_ID, env = "ORACLE_PROGRAM_ID")]
    program_id: Identifier,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Create a price/product account pair for a symbol pair.
    Initialize {
        #[arg(long)]
        payer: Identifier,
        /// Display price, scaled by the exponent before encoding.
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        quote: String,
        #[arg(long)]
        base: String,
        #[arg(long, allow_negative_numbers = true)]
        expo: i32,
        /// Store the generated key pairs in this directory. They co-sign the
        /// instruction, so there is no way to proceed without them.
        #[arg(long)]
        keypair_dir: PathBuf,
    },
    /// Set the price of an existing price account.
    Update {
        #[arg(long)]
        price: Decimal,
        #[arg(long, allow_negative_numbers = true)]
        expo: i32,
        #[arg(long)]
        target: Identifier,
    },
    /// Decode fetched price account bytes.
    DecodePrice {
        file: PathBuf,
        /// The file holds hex text rather than raw bytes.
        #[arg(long)]
        hex: bool,
        /// Exponent of the matching product, to print the display price.
        #[arg(long, allow_negative_numbers = true)]
        expo: Option<i32>,
    },
    /// Decode fetched product account bytes.
    DecodeProduct {
        file: PathBuf,
        #[arg(long)]
        hex: bool,
    },
}

fn read_account(file: &Path, hex: bool) -> Result<Vec<u8>> {
    let raw = fs::read(file).with_context(|| format!("Failed to read `{}`", file.display()))?;
    parse_account_data(raw, hex)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = File::open(&args.registry)
        .with_context(|| format!("Failed to open `{}`", args.registry.display()))?;
    let registry = load_registry(file)?;

    let mut keypair_dir = None;
    let command = match args.command {
        CliCommand::Initialize {
            payer,
            price,
            quote,
            base,
            expo,
            keypair_dir: dir,
        } => {
            keypair_dir = Some(dir);
            Command::Initialize {
                payer,
                price,
                quote,
                base,
                expo,
            }
        }
        CliCommand::Update { price, expo, target } => Command::Update { price, expo, target },
        CliCommand::DecodePrice { file, hex, expo } => Command::DecodePrice {
            data: read_account(&file, hex)?,
            expo,
        },
        CliCommand::DecodeProduct { file, hex } => Command::DecodeProduct {
            data: read_account(&file, hex)?,
        },
    };

    let service = Service {
        encoder: InstructionEncoder::new(OracleConfig::new(args.program_id, registry)),
        output: &mut std::io::stdout(),
        keypair_dir,
    };
    service.run(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INITIALIZE: [&str; 11] = [
        "oracle-layout",
        "initialize",
        "--payer",
        "11111111111111111111111111111111",
        "--price",
        "23500.5",
        "--quote",
        "reVND",
        "--base",
        "RENEC",
        "--expo=-2",
    ];

    #[test]
    fn initialize_requires_keypair_dir() {
        let err = Args::try_parse_from(INITIALIZE).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let with_dir = INITIALIZE.iter().chain(&["--keypair-dir", "keys"]);
        let args = Args::try_parse_from(with_dir).unwrap();
        match args.command {
            CliCommand::Initialize { keypair_dir, expo, .. } => {
                assert_eq!(keypair_dir, PathBuf::from("keys"));
                assert_eq!(expo, -2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
