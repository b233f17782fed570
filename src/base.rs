use crate::error::{KeyGenError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One symbol of the key alphabet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Base {
    A,
    C,
    T,
    G,
}

/// Draw order used by the candidate generator.
pub const ALPHABET: [Base; 4] = [Base::A, Base::C, Base::T, Base::G];

impl Base {
    #[inline(always)]
    pub fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::T => Self::A,
            Self::C => Self::G,
            Self::G => Self::C,
        }
    }

    #[inline(always)]
    pub fn is_gc(self) -> bool {
        matches!(self, Self::C | Self::G)
    }

    #[inline(always)]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::C => 'C',
            Self::T => 'T',
            Self::G => 'G',
        }
    }

    pub fn from_letter(letter: char) -> Result<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Ok(Self::A),
            'C' => Ok(Self::C),
            'T' => Ok(Self::T),
            'G' => Ok(Self::G),
            _ => Err(KeyGenError::Alphabet(letter)),
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Position-wise complement of a window, not reversed.
pub fn complement(bases: &[Base]) -> Vec<Base> {
    bases.iter().map(|b| b.complement()).collect()
}
