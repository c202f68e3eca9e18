use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::OracleConfig,
    identifier::{
        IdentityGenerator, Identifier, Keypair, RandomIdentityGenerator, SYSTEM_PROGRAM_ID,
    },
    layout::{Field, Layout, LayoutError, Record},
};

const INITIALIZE_PRICE_FIELDS: &[Field] = &[
    Field::u8("instruction"),
    Field::u64("price"),
    Field::long_string("quote_currency"),
    Field::long_string("base_currency"),
    Field::i32("expo"),
    Field::identifier("quote_mint"),
    Field::identifier("base_mint"),
];

const UPDATE_PRICE_FIELDS: &[Field] = &[Field::u8("instruction"), Field::u64("price")];

pub const INITIALIZE_PRICE_LAYOUT: Layout = Layout::new(INITIALIZE_PRICE_FIELDS);
pub const UPDATE_PRICE_LAYOUT: Layout = Layout::new(UPDATE_PRICE_FIELDS);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstructionError {
    #[error("Symbol `{symbol}` is not in the registry")]
    UnknownSymbol { symbol: String },
    #[error("Unknown instruction opcode {opcode}")]
    UnknownOpcode { opcode: u8 },
    #[error("Instruction data is empty")]
    EmptyData,
    #[error("Identity generator returned {identifier} more than once")]
    IdentityReused { identifier: Identifier },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    InitializePrice = 0,
    UpdatePrice = 1,
}

impl Opcode {
    pub fn layout(self) -> Layout {
        match self {
            Opcode::InitializePrice => INITIALIZE_PRICE_LAYOUT,
            Opcode::UpdatePrice => UPDATE_PRICE_LAYOUT,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = InstructionError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        match opcode {
            0 => Ok(Opcode::InitializePrice),
            1 => Ok(Opcode::UpdatePrice),
            opcode => Err(InstructionError::UnknownOpcode { opcode }),
        }
    }
}

/// Typed payload of a mock oracle instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleInstruction {
    InitializePrice {
        price: u64,
        quote_currency: String,
        base_currency: String,
        expo: i32,
        quote_mint: Identifier,
        base_mint: Identifier,
    },
    UpdatePrice {
        price: u64,
    },
}

impl OracleInstruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            OracleInstruction::InitializePrice { .. } => Opcode::InitializePrice,
            OracleInstruction::UpdatePrice { .. } => Opcode::UpdatePrice,
        }
    }

    pub fn to_record(&self) -> Record {
        let record = Record::new().with("instruction", self.opcode() as u8);
        match self {
            OracleInstruction::InitializePrice {
                price,
                quote_currency,
                base_currency,
                expo,
                quote_mint,
                base_mint,
            } => record
                .with("price", *price)
                .with("quote_currency", quote_currency.as_str())
                .with("base_currency", base_currency.as_str())
                .with("expo", *expo)
                .with("quote_mint", *quote_mint)
                .with("base_mint", *base_mint),
            OracleInstruction::UpdatePrice { price } => record.with("price", *price),
        }
    }

    /// Serializes into a buffer of exactly the encoded size.
    pub fn pack(&self) -> Result<Vec<u8>, InstructionError> {
        Ok(self.opcode().layout().encode(&self.to_record())?)
    }

    pub fn unpack(data: &[u8]) -> Result<Self, InstructionError> {
        let (&opcode, _) = data.split_first().ok_or(InstructionError::EmptyData)?;
        let opcode = Opcode::try_from(opcode)?;
        let record = opcode.layout().decode(data)?;
        Ok(match opcode {
            Opcode::InitializePrice => OracleInstruction::InitializePrice {
                price: record.u64("price")?,
                quote_currency: record.string("quote_currency")?.to_owned(),
                base_currency: record.string("base_currency")?.to_owned(),
                expo: record.i32("expo")?,
                quote_mint: record.identifier("quote_mint")?,
                base_mint: record.identifier("base_mint")?,
            },
            Opcode::UpdatePrice => OracleInstruction::UpdatePrice {
                price: record.u64("price")?,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountMeta {
    pub pubkey: Identifier,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn signer(pubkey: Identifier) -> Self {
        Self {
            pubkey,
            is_signer: true,
            is_writable: true,
        }
    }

    pub fn writable(pubkey: Identifier) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Identifier) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: false,
        }
    }
}

/// Instruction ready to hand to a transaction builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub program_id: Identifier,
    pub accounts: Vec<AccountMeta>,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl Instruction {
    /// Accounts that must sign any transaction carrying this instruction.
    pub fn signers(&self) -> impl Iterator<Item = Identifier> + '_ {
        self.accounts.iter().filter(|meta| meta.is_signer).map(|meta| meta.pubkey)
    }
}

fn serialize_hex<T, S>(data: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(data))
}

/// Result of [`InstructionEncoder::initialize`]. Both generated key pairs must
/// co-sign the transaction alongside the payer.
#[derive(Debug, Clone)]
pub struct InitializePrice {
    pub instruction: Instruction,
    pub price_account: Keypair,
    pub product_account: Keypair,
}

impl InitializePrice {
    pub fn co_signers(&self) -> [&Keypair; 2] {
        [&self.price_account, &self.product_account]
    }
}

pub struct InstructionEncoder<G = RandomIdentityGenerator> {
    config: OracleConfig,
    generator: G,
}

impl InstructionEncoder {
    pub fn new(config: OracleConfig) -> Self {
        Self::with_generator(config, RandomIdentityGenerator)
    }
}

impl<G> InstructionEncoder<G>
where
    G: IdentityGenerator,
{
    pub fn with_generator(config: OracleConfig, generator: G) -> Self {
        Self { config, generator }
    }

    /// Builds the instruction creating a price/product account pair for
    /// `quote_symbol`/`base_symbol`. The currency strings written on chain are
    /// the symbols themselves.
    pub fn initialize(
        &mut self,
        payer: Identifier,
        price: u64,
        quote_symbol: &str,
        base_symbol: &str,
        expo: i32,
    ) -> Result<InitializePrice, InstructionError> {
        let quote_mint = self.mint(quote_symbol)?;
        let base_mint = self.mint(base_symbol)?;
        let data = OracleInstruction::InitializePrice {
            price,
            quote_currency: quote_symbol.to_owned(),
            base_currency: base_symbol.to_owned(),
            expo,
            quote_mint,
            base_mint,
        }
        .pack()?;

        // keys are only generated once the payload is known to encode
        let price_account = self.generator.generate();
        let product_account = self.generator.generate();
        let price_id = price_account.identifier();
        let product_id = product_account.identifier();
        if price_id == product_id || price_id == payer {
            return Err(InstructionError::IdentityReused { identifier: price_id });
        }
        if product_id == payer {
            return Err(InstructionError::IdentityReused {
                identifier: product_id,
            });
        }

        debug!(
            %price_id,
            %product_id,
            len = data.len(),
            "encoded initialize price instruction"
        );
        Ok(InitializePrice {
            instruction: Instruction {
                program_id: self.config.program_id,
                accounts: vec![
                    AccountMeta::signer(price_id),
                    AccountMeta::signer(product_id),
                    AccountMeta::signer(payer),
                    AccountMeta::readonly(SYSTEM_PROGRAM_ID),
                ],
                data,
            },
            price_account,
            product_account,
        })
    }

    pub fn update_price(
        &self,
        price: u64,
        price_account: Identifier,
    ) -> Result<Instruction, InstructionError> {
        let data = OracleInstruction::UpdatePrice { price }.pack()?;
        debug!(%price_account, price, "encoded update price instruction");
        Ok(Instruction {
            program_id: self.config.program_id,
            accounts: vec![AccountMeta::writable(price_account)],
            data,
        })
    }

    fn mint(&self, symbol: &str) -> Result<Identifier, InstructionError> {
        self.config
            .registry
            .identifier(symbol)
            .ok_or_else(|| InstructionError::UnknownSymbol {
                symbol: symbol.to_owned(),
            })
    }
}
