/// Binary layout codec: field descriptors composed into ordered layouts
/// that encode named records into byte buffers and decode them back.
pub mod layout;

/// 32-byte account identifiers, key pairs and the source of fresh identities.
pub mod identifier;

/// Mint identifiers and token metadata keyed by asset symbol.
pub mod registry;

/// Deployment settings handed to the instruction encoder.
pub mod config;

/// Mock oracle instruction payloads (initialize price/product, update price).
pub mod instruction;

/// Price and product account records read back from the ledger.
///
/// NOTE: decoding does not check the discriminator or version, see
/// [`account::PriceRecord::expect_header`] for an explicit check.
pub mod account;

/// Conversion between display prices and the raw integers stored on chain.
pub mod price;

/// Ideally, this module should exist in its own crate, as a way to
/// bootstrap core logic. However, the integration tests drive it directly
/// so it lives here.
pub mod bin_utils;
