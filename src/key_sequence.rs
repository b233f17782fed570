use crate::{
    base::Base,
    error::{KeyGenError, Result},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// A fixed-length run of bases. Length is set when the sequence is built
/// and never changes afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeySequence {
    bases: Vec<Base>,
}

impl KeySequence {
    pub fn from_bases(bases: Vec<Base>) -> Result<Self> {
        if bases.is_empty() {
            return Err(KeyGenError::EmptySequence);
        }
        Ok(Self { bases })
    }

    #[inline(always)]
    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Fraction of bases that are C or G.
    pub fn gc_fraction(&self) -> f64 {
        gc_fraction(&self.bases)
    }
}

pub(crate) fn gc_fraction(bases: &[Base]) -> f64 {
    if bases.is_empty() {
        return 0.0;
    }
    let gc = bases.iter().filter(|b| b.is_gc()).count() as f64;
    gc / bases.len() as f64
}

impl FromStr for KeySequence {
    type Err = KeyGenError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bases = Vec::with_capacity(s.len());
        for c in s.trim().chars() {
            bases.push(Base::from_letter(c)?);
        }
        Self::from_bases(bases)
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.bases.iter().map(|b| b.as_char()).collect();
        f.write_str(&text)
    }
}

impl Serialize for KeySequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for KeySequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
