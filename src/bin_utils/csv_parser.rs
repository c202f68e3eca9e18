use std::io::Read;

use csv::{DeserializeRecordsIntoIter, Trim};
use serde::Deserialize;

use crate::identifier::Identifier;

/// One registry line. Metadata columns are either all present or all empty.
#[derive(Debug, Deserialize)]
pub struct RegistryRow {
    pub symbol: String,
    pub address: Identifier,
    pub name: Option<String>,
    pub token_symbol: Option<String>,
    pub decimals: Option<u8>,
    pub uri: Option<String>,
}

/// Parses a symbol registry in CSV format, yielding each row with its line number.
pub struct CsvRegistryParser<R> {
    iter: DeserializeRecordsIntoIter<R, RegistryRow>,
}

impl<R> CsvRegistryParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvRegistryParser<R>
where
    R: Read,
{
    type Item = (u64, csv::Result<RegistryRow>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}
