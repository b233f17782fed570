use keygen_protocol::KeySpace;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KeyGenError>;

#[derive(Debug, Error)]
pub enum KeyGenError {
    #[error("Invalid parameter '{name}': {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: String,
    },

    #[error("Invalid base: {0:?}")]
    Alphabet(char),

    #[error("Empty sequence")]
    EmptySequence,

    #[error("No acceptable key after {rounds} generation rounds")]
    RoundLimit { rounds: usize },

    #[error("No {space} record with id {id}")]
    UnknownRecord { space: KeySpace, id: u64 },

    #[error("{0}")]
    Storage(String),
}

impl KeyGenError {
    pub(crate) fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}
