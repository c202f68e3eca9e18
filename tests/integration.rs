use std::str::from_utf8;

use oracle_layout::{
    account::{PRICE_RECORD_LEN, PriceRecord, ProductRecord},
    bin_utils::{Command, Service, load_registry, parse_account_data},
    config::{DEFAULT_PROGRAM_ID, OracleConfig},
    identifier::{IdentityGenerator, Identifier, Keypair},
    instruction::{InstructionEncoder, OracleInstruction},
    registry::SymbolRegistry,
};
use rust_decimal::Decimal;

const REGISTRY_FILE: &str = include_str!("../registry/renec-testnet.csv");

fn registry() -> SymbolRegistry {
    load_registry(REGISTRY_FILE.as_bytes()).unwrap()
}

fn run(command: Command) -> String {
    let mut output = Vec::new();
    let service = Service {
        encoder: InstructionEncoder::new(OracleConfig::new(
            DEFAULT_PROGRAM_ID.parse().unwrap(),
            registry(),
        )),
        output: &mut output,
        keypair_dir: None,
    };
    service.run(command).unwrap();
    from_utf8(&output).unwrap().to_owned()
}

#[test]
fn load_shipped_registry() {
    let registry = registry();
    assert_eq!(registry.len(), 7);
    assert_eq!(
        registry.identifier("RENEC").unwrap().to_string(),
        "So11111111111111111111111111111111111111112"
    );
    assert!(registry.metadata("RENEC").is_none());

    let vnd = registry.metadata("reVND").unwrap();
    assert_eq!(vnd.symbol, "VND");
    assert_eq!(vnd.decimals, 0);
}

#[test]
fn reject_broken_registry() {
    let duplicate = "symbol,address\n\
        reVND,11111111111111111111111111111111\n\
        reVND,So11111111111111111111111111111111111111112\n";
    let err = load_registry(duplicate.as_bytes()).unwrap_err();
    assert!(format!("{err:#}").contains("registered twice"), "{err:#}");

    let bad_address = "symbol,address\nreVND,not-base58\n";
    assert!(load_registry(bad_address.as_bytes()).is_err());

    let partial = "symbol,address,name,token_symbol,decimals,uri\n\
        reVND,11111111111111111111111111111111,VND,,,\n";
    let err = load_registry(partial.as_bytes()).unwrap_err();
    assert!(format!("{err:#}").contains("complete or absent"), "{err:#}");
}

#[test]
fn initialize_command() {
    let payer: Identifier = "Fw8PeLLm7fuLVvAxzpxV3YXGBpazQuZos4dtpFU7PZMm".parse().unwrap();
    let output = run(Command::Initialize {
        payer,
        price: Decimal::new(2_350_050, 2),
        quote: "reVND".to_string(),
        base: "RENEC".to_string(),
        expo: -2,
    });

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["instruction"]["program_id"], DEFAULT_PROGRAM_ID);

    let data = hex::decode(json["instruction"]["data"].as_str().unwrap()).unwrap();
    let registry = registry();
    assert_eq!(
        OracleInstruction::unpack(&data).unwrap(),
        OracleInstruction::InitializePrice {
            price: 2_350_050,
            quote_currency: "reVND".to_string(),
            base_currency: "RENEC".to_string(),
            expo: -2,
            quote_mint: registry.identifier("reVND").unwrap(),
            base_mint: registry.identifier("RENEC").unwrap(),
        }
    );

    let accounts = json["instruction"]["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 4);
    assert_eq!(accounts[0]["pubkey"], json["price_account"]);
    assert_eq!(accounts[1]["pubkey"], json["product_account"]);
    assert_eq!(accounts[2]["pubkey"], payer.to_string());
    assert_ne!(json["price_account"], json["product_account"]);
}

#[test]
fn update_command() {
    let target: Identifier = "Hw8R4EuTpy8PgqeJCcTgybR5AhLpqtwXVdxnDTYVPTbr".parse().unwrap();
    let output = run(Command::Update {
        price: Decimal::new(85, 2),
        expo: -6,
        target,
    });
    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["data"], "0150f80c0000000000");
    assert_eq!(json["accounts"][0]["pubkey"], target.to_string());
    assert_eq!(json["accounts"][0]["is_writable"], true);
}

#[test]
fn decode_price_command() {
    let record = PriceRecord {
        discriminator: 1,
        version: 1,
        status: 1,
        product_account: Identifier::new([0; 32]),
        price: 2_350_050,
        num_publishers: 1,
        timestamp: 1_700_000_000,
        prev_price: 2_340_000,
        prev_timestamp: 1_699_999_000,
        bump: 255,
    };
    let bytes = record.encode().unwrap();
    assert_eq!(bytes.len(), PRICE_RECORD_LEN);

    let output = run(Command::DecodePrice {
        data: bytes,
        expo: Some(-2),
    });
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        [
            "product_account,price,ui_price,num_publishers,timestamp,prev_price,prev_timestamp,status,discriminator,version,bump",
            "11111111111111111111111111111111,2350050,23500.50,1,1700000000,2340000,1699999000,1,1,1,255",
        ]
    );
}

#[test]
fn decode_product_command_from_hex() {
    let record = ProductRecord {
        discriminator: 2,
        version: 1,
        status: 1,
        asset_type: 0,
        quote_currency: "reVND".to_string(),
        quote_mint: registry().identifier("reVND").unwrap(),
        base_currency: "RENEC".to_string(),
        base_mint: registry().identifier("RENEC").unwrap(),
        price_account: Identifier::new([0; 32]),
        expo: -2,
        max_price: 3_000_000,
        min_price: 1_000,
        window_size: 600,
        controller: Identifier::new([0; 32]),
        bump: 254,
    };
    let text = format!("{}\n", hex::encode(record.encode().unwrap()));
    let data = parse_account_data(text.into_bytes(), true).unwrap();

    let output = run(Command::DecodeProduct { data });
    let mut lines = output.lines();
    assert!(
        lines
            .next()
            .unwrap()
            .starts_with("discriminator,version,status,asset_type,quote_currency")
    );
    let row = lines.next().unwrap();
    assert!(
        row.starts_with("2,1,1,0,reVND,Emqxh2Z6dnFEvBka77zqS1xq6Zkoxa8MduBHswqYxsez,RENEC,"),
        "{row}"
    );
    assert!(
        row.ends_with(",-2,3000000,1000,600,11111111111111111111111111111111,254"),
        "{row}"
    );
    assert!(lines.next().is_none());
}

#[test]
fn decode_truncated_account() {
    let mut output = Vec::new();
    let service = Service {
        encoder: InstructionEncoder::new(OracleConfig::new(Identifier::default(), registry())),
        output: &mut output,
        keypair_dir: None,
    };
    let err = service
        .run(Command::DecodePrice {
            data: vec![0; PRICE_RECORD_LEN - 1],
            expo: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("Price record is truncated"), "{err}");
    assert!(output.is_empty());
}

#[test]
fn initialize_stores_keypairs() {
    let dir = std::env::temp_dir().join(format!("oracle-layout-keys-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let mut output = Vec::new();
    let service = Service {
        encoder: InstructionEncoder::new(OracleConfig::new(Identifier::default(), registry())),
        output: &mut output,
        keypair_dir: Some(dir.clone()),
    };
    service
        .run(Command::Initialize {
            payer: Identifier::new([9; 32]),
            price: Decimal::from(25_000),
            quote: "reVND".to_string(),
            base: "reUSD".to_string(),
            expo: 0,
        })
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    for key in ["price_account", "product_account"] {
        let id: Identifier = json[key].as_str().unwrap().parse().unwrap();
        let file = std::fs::read(dir.join(format!("{id}.json"))).unwrap();
        let bytes: Vec<u8> = serde_json::from_slice(&file).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(&bytes[32..], id.as_bytes());
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

struct SeededGenerator(u8);

impl IdentityGenerator for SeededGenerator {
    fn generate(&mut self) -> Keypair {
        self.0 += 1;
        Keypair::from_seed([self.0; 32])
    }
}

fn initialize_into(dir: &std::path::Path) -> anyhow::Result<Vec<u8>> {
    let mut output = Vec::new();
    let config = OracleConfig::new(Identifier::default(), registry());
    let service = Service {
        encoder: InstructionEncoder::with_generator(config, SeededGenerator(0)),
        output: &mut output,
        keypair_dir: Some(dir.to_path_buf()),
    };
    service.run(Command::Initialize {
        payer: Identifier::new([9; 32]),
        price: Decimal::from(25_000),
        quote: "reVND".to_string(),
        base: "reUSD".to_string(),
        expo: 0,
    })?;
    Ok(output)
}

#[cfg(unix)]
#[test]
fn stored_keypairs_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("oracle-layout-perms-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    initialize_into(&dir).unwrap();
    for seed in [1u8, 2] {
        let id = Keypair::from_seed([seed; 32]).identifier();
        let mode = std::fs::metadata(dir.join(format!("{id}.json")))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o077, 0, "key file mode {:o}", mode & 0o777);
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn stored_keypairs_are_never_overwritten() {
    let dir = std::env::temp_dir().join(format!("oracle-layout-existing-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let id = Keypair::from_seed([1; 32]).identifier();
    let existing = dir.join(format!("{id}.json"));
    std::fs::write(&existing, "keep").unwrap();

    let err = initialize_into(&dir).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to create"), "{err:#}");
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "keep");
    std::fs::remove_dir_all(&dir).unwrap();
}
