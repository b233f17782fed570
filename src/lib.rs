pub mod about;
pub mod base;
pub mod candidate;
pub mod error;
pub mod generator;
pub mod key_sequence;
pub mod keygen_shell;
pub mod ledger;
pub mod parameters;
pub mod session;
pub mod trace;
pub mod uniqueness;
pub mod validator;

pub use error::{KeyGenError, Result};
pub use generator::{GenerationResult, generate};
pub use keygen_protocol::KeySpace;
pub use parameters::ConstraintParameters;
pub use uniqueness::accept;
pub use validator::{ValidationOutcome, validate};

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise `env_logger` once. Without `RUST_LOG`, info and above is shown
/// plus every trace event, which only flow when a session has debug on.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let default = format!("info,{}=debug", trace::TRACE_TARGET);
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
            .format_timestamp_millis()
            .init();
    });
}
