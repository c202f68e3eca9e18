use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::identifier::Identifier;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Symbol `{symbol}` is registered twice")]
    DuplicateSymbol { symbol: String },
    #[error("Symbol must not be empty")]
    EmptySymbol,
}

/// Display metadata of a token mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub identifier: Identifier,
    pub metadata: Option<TokenMetadata>,
}

/// Deployed mint identifiers keyed by short asset symbol, e.g. `reVND`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        symbol: impl Into<String>,
        entry: RegistryEntry,
    ) -> Result<(), RegistryError> {
        let symbol = symbol.into();
        if symbol.is_empty() {
            return Err(RegistryError::EmptySymbol);
        }
        if self.entries.contains_key(&symbol) {
            return Err(RegistryError::DuplicateSymbol { symbol });
        }
        self.entries.insert(symbol, entry);
        Ok(())
    }

    pub fn lookup(&self, symbol: &str) -> Option<&RegistryEntry> {
        self.entries.get(symbol)
    }

    pub fn identifier(&self, symbol: &str) -> Option<Identifier> {
        self.lookup(symbol).map(|entry| entry.identifier)
    }

    pub fn metadata(&self, symbol: &str) -> Option<&TokenMetadata> {
        self.lookup(symbol).and_then(|entry| entry.metadata.as_ref())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8) -> RegistryEntry {
        RegistryEntry {
            identifier: Identifier::new([byte; 32]),
            metadata: None,
        }
    }

    #[test]
    fn lookup_symbols() {
        let mut registry = SymbolRegistry::new();
        registry.insert("reVND", entry(1)).unwrap();
        registry
            .insert(
                "reBNB",
                RegistryEntry {
                    metadata: Some(TokenMetadata {
                        name: "BNB".to_string(),
                        symbol: "BNB".to_string(),
                        decimals: 9,
                        uri: "https://example.com/BNB.json".to_string(),
                    }),
                    ..entry(2)
                },
            )
            .unwrap();

        assert_eq!(registry.identifier("reVND"), Some(Identifier::new([1; 32])));
        assert_eq!(registry.metadata("reVND"), None);
        assert_eq!(registry.metadata("reBNB").unwrap().decimals, 9);
        // symbols are case sensitive
        assert_eq!(registry.identifier("REVND"), None);
        assert_eq!(registry.symbols().collect::<Vec<_>>(), ["reBNB", "reVND"]);
    }

    #[test]
    fn reject_duplicates() {
        let mut registry = SymbolRegistry::new();
        registry.insert("RENEC", entry(1)).unwrap();
        let err = registry.insert("RENEC", entry(2)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateSymbol {
                symbol: "RENEC".to_string()
            }
        );
        assert_eq!(registry.identifier("RENEC"), Some(Identifier::new([1; 32])));
        assert_eq!(registry.insert("", entry(3)).unwrap_err(), RegistryError::EmptySymbol);
    }
}
