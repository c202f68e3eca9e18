use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::{
    identifier::Identifier,
    layout::{Field, Layout, LayoutError, Record},
};

const PRICE_RECORD_FIELDS: &[Field] = &[
    Field::u64("discriminator"),
    Field::u16("version"),
    Field::u8("status"),
    Field::identifier("product_account"),
    Field::u64("price"),
    Field::u16("num_publishers"),
    Field::u64("timestamp"),
    Field::u64("prev_price"),
    Field::u64("prev_timestamp"),
    Field::u8("bump"),
];

const PRODUCT_RECORD_FIELDS: &[Field] = &[
    Field::u64("discriminator"),
    Field::u16("version"),
    Field::u8("status"),
    Field::u8("asset_type"),
    Field::short_string("quote_currency"),
    Field::identifier("quote_mint"),
    Field::short_string("base_currency"),
    Field::identifier("base_mint"),
    Field::identifier("price_account"),
    Field::i32("expo"),
    Field::u64("max_price"),
    Field::u64("min_price"),
    Field::u64("window_size"),
    Field::identifier("controller"),
    Field::u8("bump"),
];

pub const PRICE_RECORD_LAYOUT: Layout = Layout::new(PRICE_RECORD_FIELDS);
pub const PRODUCT_RECORD_LAYOUT: Layout = Layout::new(PRODUCT_RECORD_FIELDS);

pub const PRICE_RECORD_LEN: usize = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Price,
    Product,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Price => f.write_str("Price"),
            RecordKind::Product => f.write_str("Product"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error(
        "{kind} record is truncated: field `{field}` needs {needed} bytes at offset {offset}, {available} available"
    )]
    TruncatedRecord {
        kind: RecordKind,
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("{kind} record header is {found:?}, expected {expected:?}")]
    UnexpectedHeader {
        kind: RecordKind,
        found: RecordHeader,
        expected: RecordHeader,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl AccountError {
    fn from_layout(kind: RecordKind, err: LayoutError) -> Self {
        match err {
            LayoutError::Truncated {
                field,
                offset,
                needed,
                available,
            } => AccountError::TruncatedRecord {
                kind,
                field,
                offset,
                needed,
                available,
            },
            err => AccountError::Layout(err),
        }
    }
}

/// Leading tag shared by both account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub discriminator: u64,
    pub version: u16,
}

impl RecordHeader {
    fn expect(self, kind: RecordKind, expected: RecordHeader) -> Result<(), AccountError> {
        if self == expected {
            Ok(())
        } else {
            Err(AccountError::UnexpectedHeader {
                kind,
                found: self,
                expected,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRecord {
    pub discriminator: u64,
    pub version: u16,
    pub status: u8,
    pub product_account: Identifier,
    pub price: u64,
    pub num_publishers: u16,
    pub timestamp: u64,
    pub prev_price: u64,
    pub prev_timestamp: u64,
    pub bump: u8,
}

impl PriceRecord {
    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            discriminator: self.discriminator,
            version: self.version,
        }
    }

    /// Decoding trusts the header; callers that know the deployed program's
    /// tag can check it here.
    pub fn expect_header(&self, expected: RecordHeader) -> Result<(), AccountError> {
        self.header().expect(RecordKind::Price, expected)
    }

    pub fn from_record(record: &Record) -> Result<Self, LayoutError> {
        Ok(Self {
            discriminator: record.u64("discriminator")?,
            version: record.u16("version")?,
            status: record.u8("status")?,
            product_account: record.identifier("product_account")?,
            price: record.u64("price")?,
            num_publishers: record.u16("num_publishers")?,
            timestamp: record.u64("timestamp")?,
            prev_price: record.u64("prev_price")?,
            prev_timestamp: record.u64("prev_timestamp")?,
            bump: record.u8("bump")?,
        })
    }

    pub fn to_record(&self) -> Record {
        Record::new()
            .with("discriminator", self.discriminator)
            .with("version", self.version)
            .with("status", self.status)
            .with("product_account", self.product_account)
            .with("price", self.price)
            .with("num_publishers", self.num_publishers)
            .with("timestamp", self.timestamp)
            .with("prev_price", self.prev_price)
            .with("prev_timestamp", self.prev_timestamp)
            .with("bump", self.bump)
    }

    /// Account bytes as the program stores them. Useful for fixtures and mocks.
    pub fn encode(&self) -> Result<Vec<u8>, AccountError> {
        Ok(PRICE_RECORD_LAYOUT.encode(&self.to_record())?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub discriminator: u64,
    pub version: u16,
    pub status: u8,
    pub asset_type: u8,
    pub quote_currency: String,
    pub quote_mint: Identifier,
    pub base_currency: String,
    pub base_mint: Identifier,
    pub price_account: Identifier,
    pub expo: i32,
    pub max_price: u64,
    pub min_price: u64,
    pub window_size: u64,
    pub controller: Identifier,
    pub bump: u8,
}

impl ProductRecord {
    pub fn header(&self) -> RecordHeader {
        RecordHeader {
            discriminator: self.discriminator,
            version: self.version,
        }
    }

    pub fn expect_header(&self, expected: RecordHeader) -> Result<(), AccountError> {
        self.header().expect(RecordKind::Product, expected)
    }

    pub fn from_record(record: &Record) -> Result<Self, LayoutError> {
        Ok(Self {
            discriminator: record.u64("discriminator")?,
            version: record.u16("version")?,
            status: record.u8("status")?,
            asset_type: record.u8("asset_type")?,
            quote_currency: record.string("quote_currency")?.to_owned(),
            quote_mint: record.identifier("quote_mint")?,
            base_currency: record.string("base_currency")?.to_owned(),
            base_mint: record.identifier("base_mint")?,
            price_account: record.identifier("price_account")?,
            expo: record.i32("expo")?,
            max_price: record.u64("max_price")?,
            min_price: record.u64("min_price")?,
            window_size: record.u64("window_size")?,
            controller: record.identifier("controller")?,
            bump: record.u8("bump")?,
        })
    }

    pub fn to_record(&self) -> Record {
        Record::new()
            .with("discriminator", self.discriminator)
            .with("version", self.version)
            .with("status", self.status)
            .with("asset_type", self.asset_type)
            .with("quote_currency", self.quote_currency.as_str())
            .with("quote_mint", self.quote_mint)
            .with("base_currency", self.base_currency.as_str())
            .with("base_mint", self.base_mint)
            .with("price_account", self.price_account)
            .with("expo", self.expo)
            .with("max_price", self.max_price)
            .with("min_price", self.min_price)
            .with("window_size", self.window_size)
            .with("controller", self.controller)
            .with("bump", self.bump)
    }

    pub fn encode(&self) -> Result<Vec<u8>, AccountError> {
        Ok(PRODUCT_RECORD_LAYOUT.encode(&self.to_record())?)
    }
}

pub fn decode_price(bytes: &[u8]) -> Result<PriceRecord, AccountError> {
    let record = PRICE_RECORD_LAYOUT
        .decode(bytes)
        .map_err(|err| AccountError::from_layout(RecordKind::Price, err))?;
    let price = PriceRecord::from_record(&record)?;
    trace!(len = bytes.len(), ?price, "decoded price record");
    Ok(price)
}

pub fn decode_product(bytes: &[u8]) -> Result<ProductRecord, AccountError> {
    let record = PRODUCT_RECORD_LAYOUT
        .decode(bytes)
        .map_err(|err| AccountError::from_layout(RecordKind::Product, err))?;
    let product = ProductRecord::from_record(&record)?;
    trace!(len = bytes.len(), ?product, "decoded product record");
    Ok(product)
}
