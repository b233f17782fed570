//! Structural checks a key must pass, applied in a fixed order.
//!
//! 1. no homopolymers (a base equal to its predecessor)
//! 2. GC fraction at most `max_gc_content`
//! 3. no window of `max_complementary_bases` whose complement occurs later
//! 4. no `min_repetitive_sequence_length` pattern repeated more than
//!    `max_allowed_repetitions` times after itself
//!
//! The window bounds of checks 3 and 4 are deliberately asymmetric: the last
//! possible folding window is never examined, and the repeat scan stops once
//! `min_len * max_reps` no longer fits behind the start position.

use crate::{
    base::{Base, complement},
    error::Result,
    key_sequence::{KeySequence, gc_fraction},
    parameters::ConstraintParameters,
    trace::{TraceEvent, TraceSink, emit},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Check {
    Homopolymer,
    GcContent,
    Folding,
    Repeats,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Homopolymer => "homopolymer",
            Self::GcContent => "GC content",
            Self::Folding => "folding",
            Self::Repeats => "repeat",
        };
        f.write_str(name)
    }
}

/// First rule a sequence violates, or `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Homopolymer,
    GCContent,
    Folding,
    Repeats,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<Check> for ValidationOutcome {
    fn from(check: Check) -> Self {
        match check {
            Check::Homopolymer => Self::Homopolymer,
            Check::GcContent => Self::GCContent,
            Check::Folding => Self::Folding,
            Check::Repeats => Self::Repeats,
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valid => "Valid",
            Self::Homopolymer => "Homopolymer",
            Self::GCContent => "GCContent",
            Self::Folding => "Folding",
            Self::Repeats => "Repeats",
        };
        f.write_str(name)
    }
}

/// A window and the later position its complement was found at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldingSite {
    pub window_start: usize,
    pub complement_start: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatHit {
    pub pattern: String,
    pub start: usize,
    pub occurrences: usize,
}

/// Result of running every check without short-circuiting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralReport {
    pub homopolymer_at: Option<usize>,
    pub gc_fraction: f64,
    pub gc_exceeded: bool,
    pub folding: Option<FoldingSite>,
    pub repeat: Option<RepeatHit>,
}

impl StructuralReport {
    pub fn outcome(&self) -> ValidationOutcome {
        if self.homopolymer_at.is_some() {
            ValidationOutcome::Homopolymer
        } else if self.gc_exceeded {
            ValidationOutcome::GCContent
        } else if self.folding.is_some() {
            ValidationOutcome::Folding
        } else if self.repeat.is_some() {
            ValidationOutcome::Repeats
        } else {
            ValidationOutcome::Valid
        }
    }
}

pub fn validate(sequence: &KeySequence, params: &ConstraintParameters) -> ValidationOutcome {
    run_checks(sequence, params, None, None)
}

pub fn validate_traced(
    sequence: &KeySequence,
    params: &ConstraintParameters,
    trace: &dyn TraceSink,
) -> ValidationOutcome {
    run_checks(sequence, params, Some(trace), None)
}

/// Parses `text` and validates it. Letters outside the alphabet are an
/// error rather than a failed check.
pub fn validate_str(text: &str, params: &ConstraintParameters) -> Result<ValidationOutcome> {
    let sequence: KeySequence = text.parse()?;
    Ok(validate(&sequence, params))
}

pub fn validate_all(sequence: &KeySequence, params: &ConstraintParameters) -> StructuralReport {
    let bases = sequence.bases();
    let gc = gc_fraction(bases);
    StructuralReport {
        homopolymer_at: find_homopolymer(bases),
        gc_fraction: gc,
        gc_exceeded: gc > params.max_gc_content,
        folding: find_folding_site(bases, params.max_complementary_bases),
        repeat: find_excessive_repeat(
            bases,
            params.min_repetitive_sequence_length,
            params.max_allowed_repetitions,
        ),
    }
}

pub(crate) fn run_checks(
    sequence: &KeySequence,
    params: &ConstraintParameters,
    trace: Option<&dyn TraceSink>,
    attempt: Option<usize>,
) -> ValidationOutcome {
    let bases = sequence.bases();
    let pass = |check: Check, detail: String| {
        emit(trace, || TraceEvent::CheckPassed {
            attempt,
            check,
            detail,
        })
    };
    let fail = |check: Check, detail: String| {
        emit(trace, || TraceEvent::CheckFailed {
            attempt,
            check,
            detail,
        });
        ValidationOutcome::from(check)
    };

    match find_homopolymer(bases) {
        Some(pos) => {
            return fail(
                Check::Homopolymer,
                format!("homopolymers detected at position {}", pos - 1),
            );
        }
        None => pass(Check::Homopolymer, "no homopolymers detected".to_string()),
    }

    let gc = gc_fraction(bases);
    if gc > params.max_gc_content {
        return fail(
            Check::GcContent,
            format!("GC content threshold exceeded: {gc}/{}", params.max_gc_content),
        );
    }
    pass(
        Check::GcContent,
        format!("GC content within tolerance: {gc}/{}", params.max_gc_content),
    );

    let window = params.max_complementary_bases;
    match find_folding_site(bases, window) {
        Some(site) => {
            return fail(
                Check::Folding,
                format!(
                    "folding possible with {window} bases (window at {}, complement at {})",
                    site.window_start, site.complement_start
                ),
            );
        }
        None => pass(
            Check::Folding,
            format!("folding not possible with {window} bases"),
        ),
    }

    match find_excessive_repeat(
        bases,
        params.min_repetitive_sequence_length,
        params.max_allowed_repetitions,
    ) {
        Some(hit) => fail(
            Check::Repeats,
            format!(
                "sequence {} repeats at least {} times",
                hit.pattern, hit.occurrences
            ),
        ),
        None => {
            pass(Check::Repeats, "excessive repeats not detected".to_string());
            ValidationOutcome::Valid
        }
    }
}

/// Position of the first base equal to its predecessor.
pub(crate) fn find_homopolymer(bases: &[Base]) -> Option<usize> {
    bases.windows(2).position(|w| w[0] == w[1]).map(|i| i + 1)
}

/// Start of the first occurrence of `needle` in `haystack` at or after `from`.
fn find_from(haystack: &[Base], needle: &[Base], from: usize) -> Option<usize> {
    let last = haystack.len().checked_sub(needle.len())?;
    (from..=last).find(|&j| &haystack[j..j + needle.len()] == needle)
}

pub(crate) fn find_folding_site(bases: &[Base], window: usize) -> Option<FoldingSite> {
    if window == 0 {
        return None;
    }
    for i in 0..bases.len().saturating_sub(window) {
        let target = complement(&bases[i..i + window]);
        if let Some(j) = find_from(bases, &target, i + 1) {
            return Some(FoldingSite {
                window_start: i,
                complement_start: j,
            });
        }
    }
    None
}

pub(crate) fn find_excessive_repeat(
    bases: &[Base],
    min_len: usize,
    max_reps: usize,
) -> Option<RepeatHit> {
    if min_len == 0 {
        return None;
    }
    let span = min_len.checked_mul(max_reps)?;
    let len = bases.len();
    let mut i = 0usize;
    while i + min_len <= len && i + span <= len {
        let pattern = &bases[i..i + min_len];
        let mut count = 0usize;
        let mut pos = find_from(bases, pattern, i + min_len);
        while let Some(p) = pos {
            count += 1;
            if count > max_reps {
                return Some(RepeatHit {
                    pattern: pattern.iter().map(|b| b.as_char()).collect(),
                    start: i,
                    occurrences: count,
                });
            }
            pos = find_from(bases, pattern, p + 1);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::KeyGenError, trace::TraceBuffer};

    const VALID: &str = "ATCGACGATGATATGAGTATCACGTGCTCAGCGCA";
    const HOMOPOLYMER: &str = "AACGACGATGATATGAGTATCACGTGCTCAGCGCA";
    const GC_RICH: &str = "CTCGACGACGACGTGCGCGTCACGTGCTCAGCGCA";
    const FOLDING: &str = "ATCGACGATGATATGAGTATCACGTAGCTGCTACT";
    const REPEATS: &str = "ATCGACGATGATGATAGTATCACGTGCTCAGCGCA";

    fn params() -> ConstraintParameters {
        ConstraintParameters {
            length: 35,
            max_gc_content: 0.5,
            max_complementary_bases: 8,
            min_repetitive_sequence_length: 3,
            max_allowed_repetitions: 1,
            ..ConstraintParameters::default()
        }
    }

    fn seq(s: &str) -> KeySequence {
        s.parse().unwrap()
    }

    #[test]
    fn test_reference_sequences() {
        let p = params();
        assert_eq!(validate(&seq(VALID), &p), ValidationOutcome::Valid);
        assert_eq!(validate(&seq(HOMOPOLYMER), &p), ValidationOutcome::Homopolymer);
        assert_eq!(validate(&seq(GC_RICH), &p), ValidationOutcome::GCContent);
        assert_eq!(validate(&seq(FOLDING), &p), ValidationOutcome::Folding);
        assert_eq!(validate(&seq(REPEATS), &p), ValidationOutcome::Repeats);
    }

    #[test]
    fn test_homopolymer_takes_precedence() {
        // also GC rich
        let p = params();
        assert_eq!(
            validate(&seq("GGCGCGCGCA"), &ConstraintParameters { length: 10, ..p }),
            ValidationOutcome::Homopolymer
        );
        assert_eq!(find_homopolymer(seq(HOMOPOLYMER).bases()), Some(1));
    }

    #[test]
    fn test_gc_threshold_is_inclusive() {
        let p = ConstraintParameters {
            length: 4,
            max_complementary_bases: 4,
            min_repetitive_sequence_length: 2,
            ..params()
        };
        // exactly half GC passes
        assert_eq!(validate(&seq("ACAG"), &p), ValidationOutcome::Valid);
        assert_eq!(validate(&seq("ACGC"), &p), ValidationOutcome::GCContent);
    }

    #[test]
    fn test_folding_window_bound_skips_last_window() {
        // window 2: only the window at 0 is examined, "AT" complements to "TA"
        assert_eq!(
            find_folding_site(seq("ATA").bases(), 2),
            Some(FoldingSite {
                window_start: 0,
                complement_start: 1
            })
        );
        // a full-length window is never examined
        assert_eq!(find_folding_site(seq("ACGT").bases(), 4), None);
        // complement must start strictly after the window start
        assert_eq!(find_folding_site(seq("ACAC").bases(), 2), None);
    }

    #[test]
    fn test_folding_reported_site() {
        let site = find_folding_site(seq(FOLDING).bases(), 8).unwrap();
        assert!(site.complement_start > site.window_start);
    }

    #[test]
    fn test_repeat_counting() {
        // "ACG" appears three times, twice after the first window
        let bases = seq("ACGTACGTACG");
        let hit = find_excessive_repeat(bases.bases(), 3, 1).unwrap();
        assert_eq!(hit.pattern, "ACG");
        assert_eq!(hit.start, 0);
        assert_eq!(hit.occurrences, 2);
        assert_eq!(find_excessive_repeat(bases.bases(), 3, 2), None);
    }

    #[test]
    fn test_repeat_search_starts_after_window() {
        // "ACA" overlaps its own next occurrence; that one is not counted
        let bases = seq("ACACAT");
        assert_eq!(find_excessive_repeat(bases.bases(), 3, 0), None);
        let bases = seq("ACATACA");
        assert_eq!(
            find_excessive_repeat(bases.bases(), 3, 0).map(|h| h.occurrences),
            Some(1)
        );
    }

    #[test]
    fn test_repeat_scan_bound() {
        // with max_reps 4 and min_len 3 only starts 0..=len-12 are scanned
        let bases = seq("ACGTCAGTACGTACGT");
        assert_eq!(find_excessive_repeat(bases.bases(), 3, 4), None);
        assert!(find_excessive_repeat(&[], 3, 1).is_none());
    }

    #[test]
    fn test_validate_all_runs_every_check() {
        let report = validate_all(&seq(HOMOPOLYMER), &params());
        assert_eq!(report.homopolymer_at, Some(1));
        assert_eq!(report.outcome(), ValidationOutcome::Homopolymer);
        assert!(report.gc_fraction > 0.0);

        let report = validate_all(&seq(VALID), &params());
        assert_eq!(report.outcome(), ValidationOutcome::Valid);
        assert!(report.folding.is_none());
        assert!(report.repeat.is_none());
    }

    #[test]
    fn test_validate_all_agrees_with_validate() {
        let p = params();
        for s in [VALID, HOMOPOLYMER, GC_RICH, FOLDING, REPEATS] {
            let s = seq(s);
            assert_eq!(validate_all(&s, &p).outcome(), validate(&s, &p));
        }
    }

    #[test]
    fn test_validate_str_rejects_unknown_symbol() {
        assert!(matches!(
            validate_str("ATCGNCGA", &params()),
            Err(KeyGenError::Alphabet('N'))
        ));
        assert_eq!(
            validate_str(VALID, &params()).unwrap(),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn test_trace_reports_each_check() {
        let buffer = TraceBuffer::new();
        assert_eq!(
            validate_traced(&seq(VALID), &params(), &buffer),
            ValidationOutcome::Valid
        );
        assert_eq!(buffer.len(), 4);
        assert!(buffer.lines().iter().all(|l| l.contains("passed")));

        let buffer = TraceBuffer::new();
        validate_traced(&seq(FOLDING), &params(), &buffer);
        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("folding check failed"));
    }
}
