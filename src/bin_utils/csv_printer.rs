use std::io::Write;

use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{account::PriceRecord, identifier::Identifier};

/// Price record as printed, with the display price when the exponent is known.
#[derive(Debug, Serialize)]
pub struct PriceRow {
    pub product_account: Identifier,
    pub price: u64,
    pub ui_price: Option<Decimal>,
    pub num_publishers: u16,
    pub timestamp: u64,
    pub prev_price: u64,
    pub prev_timestamp: u64,
    pub status: u8,
    pub discriminator: u64,
    pub version: u16,
    pub bump: u8,
}

impl PriceRow {
    pub fn new(record: PriceRecord, ui_price: Option<Decimal>) -> Self {
        Self {
            product_account: record.product_account,
            price: record.price,
            ui_price,
            num_publishers: record.num_publishers,
            timestamp: record.timestamp,
            prev_price: record.prev_price,
            prev_timestamp: record.prev_timestamp,
            status: record.status,
            discriminator: record.discriminator,
            version: record.version,
            bump: record.bump,
        }
    }
}

pub fn print_rows<W, T>(output: &mut W, rows: impl Iterator<Item = T>) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize,
{
    let mut writer = Writer::from_writer(output);
    for row in rows {
        if let Err(err) = writer.serialize(row) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
