//! Random candidate sequences.
//!
//! Randomness is always supplied by the caller. Anything implementing
//! [`rand::RngCore`] is a [`BaseSource`]; tests can script exact bases with
//! [`ScriptedBases`].

use crate::{
    base::{ALPHABET, Base},
    error::{KeyGenError, Result},
    key_sequence::KeySequence,
};
use rand::{Rng, RngCore};

/// Supplier of uniformly drawn bases.
pub trait BaseSource {
    fn next_base(&mut self) -> Base;
}

impl<R: RngCore + ?Sized> BaseSource for R {
    #[inline(always)]
    fn next_base(&mut self) -> Base {
        ALPHABET[self.random_range(0..ALPHABET.len())]
    }
}

/// Replays a fixed list of bases, wrapping around at the end. Feeding
/// [`generate_without_homopolymers`] needs at least two distinct bases, or it
/// never finds a base that differs from its predecessor.
#[derive(Debug, Clone)]
pub struct ScriptedBases {
    bases: Vec<Base>,
    pos: usize,
}

impl ScriptedBases {
    pub fn new(bases: Vec<Base>) -> Result<Self> {
        if bases.is_empty() {
            return Err(KeyGenError::EmptySequence);
        }
        Ok(Self { bases, pos: 0 })
    }

    pub fn from_letters(letters: &str) -> Result<Self> {
        let bases = letters
            .chars()
            .map(Base::from_letter)
            .collect::<Result<Vec<_>>>()?;
        Self::new(bases)
    }

    /// Number of bases handed out so far.
    pub fn drawn(&self) -> usize {
        self.pos
    }
}

impl BaseSource for ScriptedBases {
    fn next_base(&mut self) -> Base {
        let base = self.bases[self.pos % self.bases.len()];
        self.pos += 1;
        base
    }
}

/// `length` independent uniform draws.
pub fn generate<S: BaseSource + ?Sized>(length: usize, source: &mut S) -> Result<KeySequence> {
    let mut bases = Vec::with_capacity(length);
    for _ in 0..length {
        bases.push(source.next_base());
    }
    KeySequence::from_bases(bases)
}

/// Like [`generate`], but each base is redrawn until it differs from its
/// predecessor. Three of four bases are always acceptable, so the expected
/// number of redraws per position is constant.
pub fn generate_without_homopolymers<S: BaseSource + ?Sized>(
    length: usize,
    source: &mut S,
) -> Result<KeySequence> {
    let mut bases: Vec<Base> = Vec::with_capacity(length);
    for _ in 0..length {
        let next = match bases.last() {
            None => source.next_base(),
            Some(&previous) => loop {
                let candidate = source.next_base();
                if candidate != previous {
                    break candidate;
                }
            },
        };
        bases.push(next);
    }
    KeySequence::from_bases(bases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_generate_length_and_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        let seq = generate(50, &mut rng).unwrap();
        assert_eq!(seq.len(), 50);
        assert!(seq.to_string().chars().all(|c| "ACTG".contains(c)));
    }

    #[test]
    fn test_generate_uses_all_bases() {
        let mut rng = StdRng::seed_from_u64(11);
        let text = generate(400, &mut rng).unwrap().to_string();
        for c in ['A', 'C', 'T', 'G'] {
            assert!(text.contains(c), "missing {c}");
        }
    }

    #[test]
    fn test_without_homopolymers_never_repeats() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let seq = generate_without_homopolymers(35, &mut rng).unwrap();
            assert!(seq.bases().windows(2).all(|w| w[0] != w[1]));
        }
    }

    #[test]
    fn test_without_homopolymers_redraws_matches() {
        let mut source = ScriptedBases::from_letters("AAACCG").unwrap();
        let seq = generate_without_homopolymers(3, &mut source).unwrap();
        assert_eq!(seq.to_string(), "ACG");
        assert_eq!(source.drawn(), 6);
    }

    #[test]
    fn test_scripted_generate() {
        let mut source = ScriptedBases::from_letters("GATTACA").unwrap();
        let seq = generate(7, &mut source).unwrap();
        assert_eq!(seq.to_string(), "GATTACA");
    }

    #[test]
    fn test_empty_script_is_rejected() {
        assert!(matches!(
            ScriptedBases::new(vec![]),
            Err(KeyGenError::EmptySequence)
        ));
        assert!(matches!(
            ScriptedBases::from_letters(""),
            Err(KeyGenError::EmptySequence)
        ));
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(0, &mut rng).is_err());
    }
}
