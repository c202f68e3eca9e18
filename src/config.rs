use crate::{identifier::Identifier, registry::SymbolRegistry};

/// Mock oracle program deployed on the renec testnet.
pub const DEFAULT_PROGRAM_ID: &str = "7BezvNnPS6eAzyNZWaCkPcMR49qpbBNrG8MX6JV3Fiva";

/// Everything the instruction encoder needs to know about the deployment.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub program_id: Identifier,
    pub registry: SymbolRegistry,
}

impl OracleConfig {
    pub fn new(program_id: Identifier, registry: SymbolRegistry) -> Self {
        Self {
            program_id,
            registry,
        }
    }
}
