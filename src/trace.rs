//! Diagnostic events emitted while generating and validating keys.
//!
//! A sink is handed into each call instead of living on a long-lived
//! generator, so concurrent generation never shares a logger. Passing no sink
//! costs nothing.

use crate::{key_sequence::KeySequence, validator::Check};
use std::{cell::RefCell, fmt};

pub const TRACE_TARGET: &str = "dna_keygen::trace";

#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    AttemptStarted {
        attempt: usize,
        max_attempts: usize,
    },
    CandidateGenerated {
        attempt: usize,
        sequence: KeySequence,
        homopolymers_avoided: bool,
    },
    CheckPassed {
        attempt: Option<usize>,
        check: Check,
        detail: String,
    },
    CheckFailed {
        attempt: Option<usize>,
        check: Check,
        detail: String,
    },
    Found {
        attempt: usize,
        sequence: KeySequence,
    },
    Exhausted {
        max_attempts: usize,
    },
}

fn prefix(f: &mut fmt::Formatter<'_>, attempt: Option<usize>) -> fmt::Result {
    match attempt {
        Some(attempt) => write!(f, "[attempt {attempt}] "),
        None => Ok(()),
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptStarted {
                attempt,
                max_attempts,
            } => write!(f, "starting attempt {attempt}/{max_attempts}"),
            Self::CandidateGenerated {
                attempt,
                sequence,
                homopolymers_avoided,
            } => {
                prefix(f, Some(*attempt))?;
                if *homopolymers_avoided {
                    write!(f, "generated random sequence without homopolymers: {sequence}")
                } else {
                    write!(f, "generated random sequence: {sequence}")
                }
            }
            Self::CheckPassed {
                attempt,
                check,
                detail,
            } => {
                prefix(f, *attempt)?;
                write!(f, "{check} check passed: {detail}")
            }
            Self::CheckFailed {
                attempt,
                check,
                detail,
            } => {
                prefix(f, *attempt)?;
                write!(f, "{check} check failed: {detail}")
            }
            Self::Found { attempt, sequence } => {
                prefix(f, Some(*attempt))?;
                write!(f, "sequence {sequence} passes all checks")
            }
            Self::Exhausted { max_attempts } => write!(
                f,
                "exceeded maximum of {max_attempts} attempts, could not generate a candidate sequence"
            ),
        }
    }
}

/// Receiver of diagnostic events.
pub trait TraceSink {
    fn emit(&self, event: &TraceEvent);
}

impl<F: Fn(&TraceEvent)> TraceSink for F {
    fn emit(&self, event: &TraceEvent) {
        self(event)
    }
}

/// Forwards every event to `log::debug!` as a human-readable line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn emit(&self, event: &TraceEvent) {
        log::debug!(target: TRACE_TARGET, "{event}");
    }
}

/// Collects rendered events in memory.
#[derive(Debug, Default)]
pub struct TraceBuffer {
    lines: RefCell<Vec<String>>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }
}

impl TraceSink for TraceBuffer {
    fn emit(&self, event: &TraceEvent) {
        self.lines.borrow_mut().push(event.to_string());
    }
}

#[inline(always)]
pub(crate) fn emit(sink: Option<&dyn TraceSink>, event: impl FnOnce() -> TraceEvent) {
    if let Some(sink) = sink {
        sink.emit(&event());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink() {
        let seen = RefCell::new(Vec::new());
        let sink = |e: &TraceEvent| seen.borrow_mut().push(e.to_string());
        emit(Some(&sink), || TraceEvent::Exhausted { max_attempts: 3 });
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].contains("maximum of 3 attempts"));
    }

    #[test]
    fn test_absent_sink_is_noop() {
        emit(None, || panic!("event must not be built without a sink"));
    }

    #[test]
    fn test_buffer_renders_prefix() {
        let buffer = TraceBuffer::new();
        buffer.emit(&TraceEvent::CheckFailed {
            attempt: Some(4),
            check: Check::Homopolymer,
            detail: "homopolymers detected".to_string(),
        });
        assert_eq!(
            buffer.lines(),
            vec!["[attempt 4] homopolymer check failed: homopolymers detected".to_string()]
        );
    }
}
