//! Nearest-neighbour uniqueness against a snapshot of issued keys.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nearest {
    pub key: String,
    pub distance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessDecision {
    pub accepted: bool,
    pub nearest: Option<Nearest>,
}

/// Corpus entry with the smallest Levenshtein distance to `candidate`.
/// On ties the entry that comes first in the corpus wins. Blank entries are
/// not keys and are skipped.
pub fn nearest<S: AsRef<str> + Sync>(candidate: &str, corpus: &[S]) -> Option<Nearest> {
    corpus
        .par_iter()
        .map(|key| key.as_ref())
        .enumerate()
        .filter(|(_, key)| !key.is_empty())
        .map(|(idx, key)| (strsim::levenshtein(candidate, key), idx))
        .min()
        .map(|(distance, idx)| Nearest {
            key: corpus[idx].as_ref().to_string(),
            distance,
        })
}

pub fn assess<S: AsRef<str> + Sync>(
    candidate: &str,
    corpus: &[S],
    minimum_edit_distance: usize,
) -> UniquenessDecision {
    let nearest = nearest(candidate, corpus);
    let accepted = nearest
        .as_ref()
        .is_none_or(|n| n.distance > minimum_edit_distance);
    UniquenessDecision { accepted, nearest }
}

/// True when `corpus` holds no key within `minimum_edit_distance` edits of
/// `candidate`. An empty corpus accepts everything.
pub fn accept<S: AsRef<str> + Sync>(
    candidate: &str,
    corpus: &[S],
    minimum_edit_distance: usize,
) -> bool {
    assess(candidate, corpus, minimum_edit_distance).accepted
}
