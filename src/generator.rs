//! Fixed-budget generate-and-validate loop.

use crate::{
    candidate::{self, BaseSource},
    error::Result,
    key_sequence::KeySequence,
    parameters::ConstraintParameters,
    trace::{TraceEvent, TraceSink, emit},
    validator::run_checks,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationResult {
    /// `attempts_used` is the zero-based index of the successful attempt.
    Found {
        sequence: KeySequence,
        attempts_used: usize,
    },
    /// Every attempt of the budget failed; `attempts_used` equals it.
    Exhausted { attempts_used: usize },
}

impl GenerationResult {
    pub fn sequence(&self) -> Option<&KeySequence> {
        match self {
            Self::Found { sequence, .. } => Some(sequence),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn into_sequence(self) -> Option<KeySequence> {
        match self {
            Self::Found { sequence, .. } => Some(sequence),
            Self::Exhausted { .. } => None,
        }
    }

    pub fn attempts_used(&self) -> usize {
        match self {
            Self::Found { attempts_used, .. } | Self::Exhausted { attempts_used } => {
                *attempts_used
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

pub fn generate<S: BaseSource + ?Sized>(
    params: &ConstraintParameters,
    source: &mut S,
) -> Result<GenerationResult> {
    run(params, source, None)
}

pub fn generate_traced<S: BaseSource + ?Sized>(
    params: &ConstraintParameters,
    source: &mut S,
    trace: &dyn TraceSink,
) -> Result<GenerationResult> {
    run(params, source, Some(trace))
}

pub(crate) fn run<S: BaseSource + ?Sized>(
    params: &ConstraintParameters,
    source: &mut S,
    trace: Option<&dyn TraceSink>,
) -> Result<GenerationResult> {
    params.validate()?;

    for attempt in 0..params.max_attempts {
        emit(trace, || TraceEvent::AttemptStarted {
            attempt,
            max_attempts: params.max_attempts,
        });

        let sequence = if params.allow_homopolymers {
            candidate::generate(params.length, source)?
        } else {
            candidate::generate_without_homopolymers(params.length, source)?
        };
        emit(trace, || TraceEvent::CandidateGenerated {
            attempt,
            sequence: sequence.clone(),
            homopolymers_avoided: !params.allow_homopolymers,
        });

        if run_checks(&sequence, params, trace, Some(attempt)).is_valid() {
            emit(trace, || TraceEvent::Found {
                attempt,
                sequence: sequence.clone(),
            });
            return Ok(GenerationResult::Found {
                sequence,
                attempts_used: attempt,
            });
        }
    }

    emit(trace, || TraceEvent::Exhausted {
        max_attempts: params.max_attempts,
    });
    Ok(GenerationResult::Exhausted {
        attempts_used: params.max_attempts,
    })
}
