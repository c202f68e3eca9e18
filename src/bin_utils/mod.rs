//! Command-line plumbing around [`oracle_layout`](crate): registry loading,
//! command dispatch and output formatting. Kept in the library so the
//! integration tests can drive it without spawning the binary.

use std::{
    fs::OpenOptions,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    account::{decode_price, decode_product},
    identifier::{IdentityGenerator, Identifier, Keypair, RandomIdentityGenerator},
    instruction::{Instruction, InstructionEncoder},
    price,
    registry::{RegistryEntry, SymbolRegistry, TokenMetadata},
};
use csv_parser::{CsvRegistryParser, RegistryRow};
use csv_printer::{PriceRow, print_rows};
pub mod csv_parser;
pub mod csv_printer;

pub fn load_registry<R: Read>(source: R) -> Result<SymbolRegistry> {
    let mut registry = SymbolRegistry::new();
    for (line, row) in CsvRegistryParser::new(source) {
        let row = row.with_context(|| format!("Invalid registry entry at line {line}"))?;
        let symbol = row.symbol.clone();
        let entry = registry_entry(row)
            .with_context(|| format!("Invalid registry entry at line {line}"))?;
        registry
            .insert(symbol, entry)
            .with_context(|| format!("Invalid registry entry at line {line}"))?;
    }
    Ok(registry)
}

fn registry_entry(row: RegistryRow) -> Result<RegistryEntry> {
    let metadata = match (row.name, row.token_symbol, row.decimals, row.uri) {
        (Some(name), Some(symbol), Some(decimals), Some(uri)) => Some(TokenMetadata {
            name,
            symbol,
            decimals,
            uri,
        }),
        (None, None, None, None) => None,
        _ => bail!("Metadata for `{}` must be complete or absent", row.symbol),
    };
    Ok(RegistryEntry {
        identifier: row.address,
        metadata,
    })
}

/// Account bytes as fetched, either raw or hex encoded text.
pub fn parse_account_data(raw: Vec<u8>, is_hex: bool) -> Result<Vec<u8>> {
    if !is_hex {
        return Ok(raw);
    }
    let text = String::from_utf8(raw).context("Hex account data is not text")?;
    hex::decode(text.trim()).context("Account data is not valid hex")
}

#[derive(Debug, Clone)]
pub enum Command {
    Initialize {
        payer: Identifier,
        price: Decimal,
        quote: String,
        base: String,
        expo: i32,
    },
    Update {
        price: Decimal,
        expo: i32,
        target: Identifier,
    },
    DecodePrice {
        data: Vec<u8>,
        expo: Option<i32>,
    },
    DecodeProduct {
        data: Vec<u8>,
    },
}

#[derive(Debug, Serialize)]
struct InitializeOutput<'a> {
    instruction: &'a Instruction,
    price_account: Identifier,
    product_account: Identifier,
}

pub struct Service<'w, W: 'w, G = RandomIdentityGenerator> {
    pub encoder: InstructionEncoder<G>,
    pub output: &'w mut W,
    /// Where generated key pairs are stored, one `<identifier>.json` file each.
    pub keypair_dir: Option<PathBuf>,
}

impl<'w, W, G> Service<'w, W, G>
where
    W: Write + 'w,
    G: IdentityGenerator,
{
    pub fn run(mut self, command: Command) -> Result<()> {
        match command {
            Command::Initialize {
                payer,
                price,
                quote,
                base,
                expo,
            } => {
                let raw = price::to_raw(price, expo)?;
                let init = self.encoder.initialize(payer, raw, &quote, &base, expo)?;
                match &self.keypair_dir {
                    Some(dir) => {
                        for keypair in init.co_signers() {
                            write_keypair(dir, keypair)?;
                        }
                    }
                    None => warn!(
                        price_account = %init.price_account.identifier(),
                        product_account = %init.product_account.identifier(),
                        "no keypair directory given, generated co-signer keys are discarded"
                    ),
                }
                info!(%quote, %base, raw, "built initialize price instruction");
                self.print_json(&InitializeOutput {
                    instruction: &init.instruction,
                    price_account: init.price_account.identifier(),
                    product_account: init.product_account.identifier(),
                })
            }
            Command::Update { price, expo, target } => {
                let raw = price::to_raw(price, expo)?;
                let instruction = self.encoder.update_price(raw, target)?;
                info!(%target, raw, "built update price instruction");
                self.print_json(&instruction)
            }
            Command::DecodePrice { data, expo } => {
                let record = decode_price(&data)?;
                let ui_price = expo.map(|expo| price::from_raw(record.price, expo)).transpose()?;
                print_rows(self.output, std::iter::once(PriceRow::new(record, ui_price)))
            }
            Command::DecodeProduct { data } => {
                let record = decode_product(&data)?;
                print_rows(self.output, std::iter::once(record))
            }
        }
    }

    fn print_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut *self.output, value).context("Failed to write JSON")?;
        writeln!(self.output).context("Failed to write JSON")?;
        Ok(())
    }
}

/// Stores the 64-byte key pair as a JSON array, readable by the owner only.
/// Never replaces an existing file.
fn write_keypair(dir: &Path, keypair: &Keypair) -> Result<()> {
    let path = dir.join(format!("{}.json", keypair.identifier()));
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options
        .open(&path)
        .with_context(|| format!("Failed to create `{}`", path.display()))?;
    serde_json::to_writer(file, keypair.to_bytes().as_slice())
        .with_context(|| format!("Failed to write `{}`", path.display()))?;
    info!(path = %path.display(), "stored generated keypair");
    Ok(())
}
