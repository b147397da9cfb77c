//! Identity command implementation.

use super::Format;
use searchsync_core::{
    DocumentIdentity, IdentityCodec, RecordKey, SyncConfig, SyncResult, TypeName,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Decoded<'a> {
    #[serde(rename = "type")]
    type_name: &'a str,
    key: &'a str,
}

/// Encodes a `(type, key)` pair.
pub fn encode(config: &SyncConfig, type_name: &str, key: &str) -> SyncResult<String> {
    let id = config
        .codec()
        .encode(&TypeName::new(type_name), &RecordKey::new(key))?;
    Ok(id.to_string())
}

/// Decodes a document identity.
pub fn decode(config: &SyncConfig, identity: &str) -> SyncResult<DocumentIdentity> {
    config.codec().decode(identity)
}

/// Runs `identity encode`.
pub fn run_encode(
    config: &SyncConfig,
    type_name: &str,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", encode(config, type_name, key)?);
    Ok(())
}

/// Runs `identity decode`.
pub fn run_decode(
    config: &SyncConfig,
    identity: &str,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let decoded = decode(config, identity)?;
    match format {
        Format::Json => {
            let view = Decoded {
                type_name: decoded.type_name.as_str(),
                key: decoded.key.as_str(),
            };
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Format::Text => {
            println!("type: {}", decoded.type_name);
            println!("key:  {}", decoded.key);
        }
    }
    Ok(())
}
