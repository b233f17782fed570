use crate::error::{KeyGenError, Result};
use itertools::Itertools;
use keygen_protocol::{CodecRecord, KeySpace, VendorRecord};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

/// Issued keys of both key-spaces, persisted as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyLedger {
    pub vendors: Vec<VendorRecord>,
    pub codecs: Vec<CodecRecord>,
    next_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub vendor_count: usize,
    pub codec_count: usize,
}

impl KeyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KeyGenError::Storage(format!("Could not read ledger file '{path}': {e}"))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            KeyGenError::Storage(format!("Could not parse ledger JSON '{path}': {e}"))
        })
    }

    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load_from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| KeyGenError::Storage(format!("Could not serialize ledger: {e}")))?;
        std::fs::write(path, text).map_err(|e| {
            KeyGenError::Storage(format!("Could not write ledger file '{path}': {e}"))
        })
    }

    /// Distinct keys issued in one key-space, in issue order.
    pub fn corpus(&self, space: KeySpace) -> Vec<String> {
        match space {
            KeySpace::Vendor => self.vendors.iter().map(|r| r.key.clone()).unique().collect(),
            KeySpace::Codec => self.codecs.iter().map(|r| r.key.clone()).unique().collect(),
        }
    }

    pub fn count(&self, space: KeySpace) -> usize {
        match space {
            KeySpace::Vendor => self.vendors.len(),
            KeySpace::Codec => self.codecs.len(),
        }
    }

    /// Appends a record with placeholder metadata and returns its id.
    pub fn record(&mut self, space: KeySpace, key: &str) -> u64 {
        self.next_id = self.next_id.max(self.max_id()) + 1;
        let id = self.next_id;
        let now = now_unix_ms();
        match space {
            KeySpace::Vendor => self.vendors.push(VendorRecord::unassigned(id, key, now)),
            KeySpace::Codec => self.codecs.push(CodecRecord::unassigned(id, key, now)),
        }
        log::info!("recorded {space} key {key} as #{id}");
        id
    }

    /// Ties a codec to the vendor that owns it by the vendor's GUID.
    pub fn link_codec(&mut self, codec_id: u64, vendor_id: u64) -> Result<&CodecRecord> {
        let vendor_guid = self
            .vendors
            .iter()
            .find(|r| r.id == vendor_id)
            .map(|r| r.guid.clone())
            .ok_or(KeyGenError::UnknownRecord {
                space: KeySpace::Vendor,
                id: vendor_id,
            })?;
        let codec = self
            .codecs
            .iter_mut()
            .find(|r| r.id == codec_id)
            .ok_or(KeyGenError::UnknownRecord {
                space: KeySpace::Codec,
                id: codec_id,
            })?;
        codec.vendor_guid = Some(vendor_guid);
        codec.last_modified_at_unix_ms = now_unix_ms();
        log::info!("linked codec #{codec_id} to vendor #{vendor_id}");
        Ok(codec)
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            vendor_count: self.vendors.len(),
            codec_count: self.codecs.len(),
        }
    }

    fn max_id(&self) -> u64 {
        self.vendors
            .iter()
            .map(|r| r.id)
            .chain(self.codecs.iter().map(|r| r.id))
            .max()
            .unwrap_or(0)
    }
}

fn now_unix_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_and_corpus_per_space() {
        let mut ledger = KeyLedger::new();
        ledger.record(KeySpace::Vendor, "ACGT");
        ledger.record(KeySpace::Vendor, "ACGT");
        ledger.record(KeySpace::Codec, "TGCA");
        assert_eq!(ledger.corpus(KeySpace::Vendor), vec!["ACGT".to_string()]);
        assert_eq!(ledger.corpus(KeySpace::Codec), vec!["TGCA".to_string()]);
        assert_eq!(ledger.count(KeySpace::Vendor), 2);
        assert_eq!(
            ledger.summary(),
            LedgerSummary {
                vendor_count: 2,
                codec_count: 1
            }
        );
    }

    #[test]
    fn test_ids_are_unique_across_spaces() {
        let mut ledger = KeyLedger::new();
        let a = ledger.record(KeySpace::Vendor, "ACGT");
        let b = ledger.record(KeySpace::Codec, "TGCA");
        let c = ledger.record(KeySpace::Vendor, "CATG");
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let path = path.to_string_lossy().to_string();

        let mut ledger = KeyLedger::load_or_default(&path).unwrap();
        assert_eq!(ledger.count(KeySpace::Vendor), 0);
        ledger.record(KeySpace::Vendor, "ACGTAC");
        ledger.record(KeySpace::Codec, "GATCGA");
        ledger.save_to_path(&path).unwrap();

        let mut loaded = KeyLedger::load_from_path(&path).unwrap();
        assert_eq!(loaded.corpus(KeySpace::Vendor), vec!["ACGTAC".to_string()]);
        assert_eq!(loaded.codecs[0].name, keygen_protocol::UNASSIGNED_CODEC);
        assert_eq!(loaded.record(KeySpace::Codec, "TTGACA"), 3);
    }

    #[test]
    fn test_link_codec_to_vendor() {
        let mut ledger = KeyLedger::new();
        let vendor = ledger.record(KeySpace::Vendor, "ACGTAC");
        let codec = ledger.record(KeySpace::Codec, "GATCGA");
        let guid = ledger.vendors[0].guid.clone();

        let linked = ledger.link_codec(codec, vendor).unwrap();
        assert_eq!(linked.vendor_guid.as_deref(), Some(guid.as_str()));

        assert!(matches!(
            ledger.link_codec(codec, codec),
            Err(KeyGenError::UnknownRecord {
                space: KeySpace::Vendor,
                ..
            })
        ));
        assert!(matches!(
            ledger.link_codec(vendor, vendor),
            Err(KeyGenError::UnknownRecord {
                space: KeySpace::Codec,
                ..
            })
        ));
    }

    #[test]
    fn test_load_reports_path_on_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let path = path.to_string_lossy().to_string();
        match KeyLedger::load_from_path(&path) {
            Err(KeyGenError::Storage(message)) => assert!(message.contains("broken.json")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
