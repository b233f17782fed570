//! Explicit per-user context for issuing keys: the edit-distance threshold,
//! the debug toggle and the constraint parameters travel together in a
//! [`KeygenSession`] instead of process-wide state.

use crate::{
    candidate::BaseSource,
    error::{KeyGenError, Result},
    generator::{self, GenerationResult},
    key_sequence::KeySequence,
    ledger::KeyLedger,
    parameters::ConstraintParameters,
    trace::{LogTrace, TraceSink},
    uniqueness::{self, Nearest, UniquenessDecision},
    validator::{self, StructuralReport, ValidationOutcome},
};
use keygen_protocol::KeySpace;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const DEFAULT_MIN_EDIT_DISTANCE: usize = 10;
pub const DEFAULT_ROUND_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Candidates within this many edits of an issued key are rejected.
    pub min_edit_distance: usize,
    /// Route trace events to the `log` facade.
    pub debug: bool,
    /// Generation rounds per key before giving up; `None` retries forever.
    pub round_limit: Option<usize>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            min_edit_distance: DEFAULT_MIN_EDIT_DISTANCE,
            debug: false,
            round_limit: Some(DEFAULT_ROUND_LIMIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedKey {
    pub space: KeySpace,
    pub id: u64,
    pub key: String,
    /// Zero-based attempt index within the successful round.
    pub attempts: usize,
    pub rounds: usize,
    pub elapsed_ms: u128,
    pub nearest: Option<Nearest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCheck {
    pub key: String,
    pub outcome: ValidationOutcome,
    pub report: StructuralReport,
    pub vendor: UniquenessDecision,
    pub codec: UniquenessDecision,
}

/// Keys issued by one batch request.
#[derive(Debug)]
pub struct IssueBatch {
    /// Accepted keys, already recorded in the ledger.
    pub issued: Vec<IssuedKey>,
    /// Why the batch stopped short, if it did.
    pub error: Option<KeyGenError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeygenSession {
    pub settings: SessionSettings,
    pub parameters: ConstraintParameters,
}

impl KeygenSession {
    pub fn new(settings: SessionSettings, parameters: ConstraintParameters) -> Self {
        Self {
            settings,
            parameters,
        }
    }

    /// Reads settings and parameters from a JSON file. Missing fields take
    /// their defaults; the parameters must validate.
    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            KeyGenError::Storage(format!("Could not read config file '{path}': {e}"))
        })?;
        let session: Self = serde_json::from_str(&text).map_err(|e| {
            KeyGenError::Storage(format!("Could not parse config JSON '{path}': {e}"))
        })?;
        session.parameters.validate()?;
        Ok(session)
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| KeyGenError::Storage(format!("Could not serialize config: {e}")))?;
        std::fs::write(path, text).map_err(|e| {
            KeyGenError::Storage(format!("Could not write config file '{path}': {e}"))
        })
    }

    fn trace(&self) -> Option<&dyn TraceSink> {
        if self.settings.debug {
            Some(&LogTrace)
        } else {
            None
        }
    }

    /// Issues `count` keys into `space`, recording each in `ledger` before
    /// the next one is generated so later keys are checked against earlier
    /// ones of the same batch. A failure stops the batch; keys issued before
    /// it stay recorded and are returned alongside the error.
    pub fn issue_keys<S: BaseSource + ?Sized>(
        &self,
        ledger: &mut KeyLedger,
        space: KeySpace,
        count: usize,
        source: &mut S,
    ) -> IssueBatch {
        let mut batch = IssueBatch {
            issued: Vec::with_capacity(count),
            error: None,
        };
        if let Err(e) = self.parameters.validate() {
            batch.error = Some(e);
            return batch;
        }
        for _ in 0..count {
            match self.issue_key(ledger, space, source) {
                Ok(key) => batch.issued.push(key),
                Err(e) => {
                    log::warn!(
                        "{space} batch stopped after {} of {count} keys: {e}",
                        batch.issued.len()
                    );
                    batch.error = Some(e);
                    break;
                }
            }
        }
        batch
    }

    pub fn issue_key<S: BaseSource + ?Sized>(
        &self,
        ledger: &mut KeyLedger,
        space: KeySpace,
        source: &mut S,
    ) -> Result<IssuedKey> {
        let started = Instant::now();
        let mut rounds = 0usize;
        loop {
            if let Some(limit) = self.settings.round_limit {
                if rounds >= limit {
                    log::warn!("giving up on {space} key after {rounds} rounds");
                    return Err(KeyGenError::RoundLimit { rounds });
                }
            }
            rounds += 1;

            let (sequence, attempts) =
                match generator::run(&self.parameters, source, self.trace())? {
                    GenerationResult::Found {
                        sequence,
                        attempts_used,
                    } => (sequence, attempts_used),
                    GenerationResult::Exhausted { attempts_used } => {
                        log::warn!(
                            "round {rounds}: no structurally valid {space} key in {attempts_used} attempts"
                        );
                        continue;
                    }
                };

            let key = sequence.to_string();
            let corpus = ledger.corpus(space);
            let decision =
                uniqueness::assess(&key, &corpus, self.settings.min_edit_distance);
            if !decision.accepted {
                log::debug!(
                    "round {rounds}: {key} too close to {space} key {:?}",
                    decision.nearest
                );
                continue;
            }

            let id = ledger.record(space, &key);
            return Ok(IssuedKey {
                space,
                id,
                key,
                attempts,
                rounds,
                elapsed_ms: started.elapsed().as_millis(),
                nearest: decision.nearest,
            });
        }
    }

    /// Structural and uniqueness assessment of an externally supplied key.
    pub fn check_key(&self, ledger: &KeyLedger, text: &str) -> Result<KeyCheck> {
        let sequence: KeySequence = text.parse()?;
        let key = sequence.to_string();
        let outcome = match self.trace() {
            Some(trace) => validator::validate_traced(&sequence, &self.parameters, trace),
            None => validator::validate(&sequence, &self.parameters),
        };
        let distance = self.settings.min_edit_distance;
        Ok(KeyCheck {
            outcome,
            report: validator::validate_all(&sequence, &self.parameters),
            vendor: uniqueness::assess(&key, &ledger.corpus(KeySpace::Vendor), distance),
            codec: uniqueness::assess(&key, &ledger.corpus(KeySpace::Codec), distance),
            key,
        })
    }
}
