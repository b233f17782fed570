//! Shared machine-readable contracts for issued DNA keys.
//!
//! These are the record shapes the key ledger persists. The generation engine
//! never sees them; it only reads the plain key strings of one [`KeySpace`].

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

pub const UNASSIGNED_VENDOR: &str = "Unassigned Vendor ID";
pub const UNASSIGNED_CODEC: &str = "Unassigned CODEC ID";

/// Independent namespace of issued keys, each with its own corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySpace {
    Vendor,
    Codec,
}

impl KeySpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Codec => "codec",
        }
    }
}

impl fmt::Display for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeySpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" | "vendors" => Ok(Self::Vendor),
            "codec" | "codecs" => Ok(Self::Codec),
            other => Err(format!(
                "Unknown key space '{other}', expected 'vendor' or 'codec'"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub id: u64,
    pub guid: String,
    pub key: String,
    pub name: String,
    pub contact_information: String,
    pub created_at_unix_ms: u128,
    pub last_modified_at_unix_ms: u128,
}

impl VendorRecord {
    pub fn unassigned(id: u64, key: &str, now_unix_ms: u128) -> Self {
        Self {
            id,
            guid: Uuid::new_v4().to_string(),
            key: key.to_string(),
            name: UNASSIGNED_VENDOR.to_string(),
            contact_information: UNASSIGNED_VENDOR.to_string(),
            created_at_unix_ms: now_unix_ms,
            last_modified_at_unix_ms: now_unix_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecRecord {
    pub id: u64,
    pub guid: String,
    pub key: String,
    pub name: String,
    pub version: String,
    pub uri: String,
    /// GUID of the owning vendor, once linked.
    #[serde(default)]
    pub vendor_guid: Option<String>,
    pub created_at_unix_ms: u128,
    pub last_modified_at_unix_ms: u128,
}

impl CodecRecord {
    pub fn unassigned(id: u64, key: &str, now_unix_ms: u128) -> Self {
        Self {
            id,
            guid: Uuid::new_v4().to_string(),
            key: key.to_string(),
            name: UNASSIGNED_CODEC.to_string(),
            version: UNASSIGNED_CODEC.to_string(),
            uri: UNASSIGNED_CODEC.to_string(),
            vendor_guid: None,
            created_at_unix_ms: now_unix_ms,
            last_modified_at_unix_ms: now_unix_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_space_parse() {
        assert_eq!("Vendor".parse::<KeySpace>(), Ok(KeySpace::Vendor));
        assert_eq!("codecs".parse::<KeySpace>(), Ok(KeySpace::Codec));
        assert!("plasmid".parse::<KeySpace>().is_err());
    }

    #[test]
    fn test_key_space_serializes_snake_case() {
        let text = serde_json::to_string(&KeySpace::Codec).unwrap();
        assert_eq!(text, "\"codec\"");
    }

    #[test]
    fn test_unassigned_records_get_distinct_guids() {
        let a = VendorRecord::unassigned(1, "ACGT", 10);
        let b = VendorRecord::unassigned(2, "TGCA", 10);
        assert_ne!(a.guid, b.guid);
        assert_eq!(a.name, UNASSIGNED_VENDOR);
        let c = CodecRecord::unassigned(1, "ACGT", 10);
        assert_eq!(c.uri, UNASSIGNED_CODEC);
        assert_eq!(c.created_at_unix_ms, c.last_modified_at_unix_ms);
        assert_eq!(c.vendor_guid, None);
    }

    #[test]
    fn test_codec_without_vendor_link_loads() {
        let text = r#"{"id":3,"guid":"g","key":"ACGT","name":"n","version":"1","uri":"u",
            "created_at_unix_ms":1,"last_modified_at_unix_ms":2}"#;
        let record: CodecRecord = serde_json::from_str(text).unwrap();
        assert_eq!(record.vendor_guid, None);
        assert_eq!(record.key, "ACGT");
    }
}
