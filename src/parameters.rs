use crate::error::{KeyGenError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_KEY_LENGTH: usize = 35;
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;
pub const DEFAULT_MAX_GC_CONTENT: f64 = 0.5;
pub const DEFAULT_MAX_COMPLEMENTARY_BASES: usize = 8;
pub const DEFAULT_MIN_REPETITIVE_SEQUENCE_LENGTH: usize = 3;
pub const DEFAULT_MAX_ALLOWED_REPETITIONS: usize = 1;

const GC_CONTENT_BOUNDS: std::ops::RangeInclusive<f64> = 0.01..=0.99;

/// Names accepted by [`ConstraintParameters::set`].
pub const PARAMETER_NAMES: [&str; 7] = [
    "length",
    "max_attempts",
    "allow_homopolymers",
    "max_gc_content",
    "max_complementary_bases",
    "min_repetitive_sequence_length",
    "max_allowed_repetitions",
];

/// Constraints one generation request runs under. Read-only once a
/// request starts; [`ConstraintParameters::validate`] must pass before any
/// attempt is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintParameters {
    pub length: usize,
    pub max_attempts: usize,
    pub allow_homopolymers: bool,
    pub max_gc_content: f64,
    pub max_complementary_bases: usize,
    pub min_repetitive_sequence_length: usize,
    pub max_allowed_repetitions: usize,
}

impl Default for ConstraintParameters {
    fn default() -> Self {
        Self {
            length: DEFAULT_KEY_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            allow_homopolymers: false,
            max_gc_content: DEFAULT_MAX_GC_CONTENT,
            max_complementary_bases: DEFAULT_MAX_COMPLEMENTARY_BASES,
            min_repetitive_sequence_length: DEFAULT_MIN_REPETITIVE_SEQUENCE_LENGTH,
            max_allowed_repetitions: DEFAULT_MAX_ALLOWED_REPETITIONS,
        }
    }
}

impl ConstraintParameters {
    /// Defaults with the given key length, validated.
    pub fn with_length(length: usize) -> Result<Self> {
        let ret = Self {
            length,
            ..Self::default()
        };
        ret.validate()?;
        Ok(ret)
    }

    pub fn validate(&self) -> Result<()> {
        if self.length < 1 {
            return Err(KeyGenError::invalid_parameter("length", self.length, ">= 1"));
        }
        if self.max_attempts < 1 {
            return Err(KeyGenError::invalid_parameter(
                "max_attempts",
                self.max_attempts,
                ">= 1",
            ));
        }
        if !GC_CONTENT_BOUNDS.contains(&self.max_gc_content) {
            return Err(KeyGenError::invalid_parameter(
                "max_gc_content",
                self.max_gc_content,
                "a fraction in [0.01, 0.99]",
            ));
        }
        if self.max_complementary_bases < 1 || self.max_complementary_bases > self.length {
            return Err(KeyGenError::invalid_parameter(
                "max_complementary_bases",
                self.max_complementary_bases,
                format!("[1, {}]", self.length),
            ));
        }
        if self.min_repetitive_sequence_length < 2
            || self.min_repetitive_sequence_length > self.length
        {
            return Err(KeyGenError::invalid_parameter(
                "min_repetitive_sequence_length",
                self.min_repetitive_sequence_length,
                format!("[2, {}]", self.length),
            ));
        }
        Ok(())
    }

    /// Sets one parameter from its textual value and re-validates the whole
    /// bundle. On failure the parameters are left unchanged.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        let value = value.trim();
        match name {
            "length" | "len" => next.length = parse_count("length", value)?,
            "max_attempts" => next.max_attempts = parse_count("max_attempts", value)?,
            "allow_homopolymers" => {
                next.allow_homopolymers = parse_flag(value).ok_or_else(|| {
                    KeyGenError::invalid_parameter("allow_homopolymers", value, "true or false")
                })?
            }
            "max_gc_content" | "gc" => {
                next.max_gc_content = value.parse().map_err(|_| {
                    KeyGenError::invalid_parameter(
                        "max_gc_content",
                        value,
                        "a fraction in [0.01, 0.99]",
                    )
                })?
            }
            "max_complementary_bases" => {
                next.max_complementary_bases = parse_count("max_complementary_bases", value)?
            }
            "min_repetitive_sequence_length" | "min_repeat_length" => {
                next.min_repetitive_sequence_length =
                    parse_count("min_repetitive_sequence_length", value)?
            }
            "max_allowed_repetitions" | "max_repeats" => {
                next.max_allowed_repetitions = parse_count("max_allowed_repetitions", value)?
            }
            other => {
                return Err(KeyGenError::invalid_parameter(
                    "name",
                    other,
                    format!("one of {}", PARAMETER_NAMES.join(", ")),
                ));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn parse_count(name: &'static str, value: &str) -> Result<usize> {
    value
        .parse::<usize>()
        .map_err(|_| KeyGenError::invalid_parameter(name, value, "a non-negative integer"))
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected_name(params: &ConstraintParameters) -> &'static str {
        match params.validate() {
            Err(KeyGenError::InvalidParameter { name, .. }) => name,
            other => panic!("expected invalid parameter, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let params = ConstraintParameters::default();
        params.validate().unwrap();
        assert_eq!(params.length, 35);
        assert_eq!(params.max_attempts, 1000);
        assert!(!params.allow_homopolymers);
    }

    #[test]
    fn test_bounds() {
        let base = ConstraintParameters::default();

        let p = ConstraintParameters { length: 0, ..base.clone() };
        assert_eq!(rejected_name(&p), "length");

        let p = ConstraintParameters { max_attempts: 0, ..base.clone() };
        assert_eq!(rejected_name(&p), "max_attempts");

        for gc in [0.0, 0.009, 0.991, 1.0, f64::NAN] {
            let p = ConstraintParameters { max_gc_content: gc, ..base.clone() };
            assert_eq!(rejected_name(&p), "max_gc_content");
        }
        for gc in [0.01, 0.99] {
            let p = ConstraintParameters { max_gc_content: gc, ..base.clone() };
            p.validate().unwrap();
        }

        let p = ConstraintParameters { max_complementary_bases: 0, ..base.clone() };
        assert_eq!(rejected_name(&p), "max_complementary_bases");
        let p = ConstraintParameters { max_complementary_bases: 36, ..base.clone() };
        assert_eq!(rejected_name(&p), "max_complementary_bases");
        let p = ConstraintParameters { max_complementary_bases: 35, ..base.clone() };
        p.validate().unwrap();

        let p = ConstraintParameters { min_repetitive_sequence_length: 1, ..base.clone() };
        assert_eq!(rejected_name(&p), "min_repetitive_sequence_length");
        let p = ConstraintParameters { min_repetitive_sequence_length: 36, ..base.clone() };
        assert_eq!(rejected_name(&p), "min_repetitive_sequence_length");

        let p = ConstraintParameters { max_allowed_repetitions: 0, ..base };
        p.validate().unwrap();
    }

    #[test]
    fn test_with_length_checks_windows_against_length() {
        assert!(ConstraintParameters::with_length(20).is_ok());
        // default window of 8 complementary bases does not fit
        assert!(ConstraintParameters::with_length(5).is_err());
    }

    #[test]
    fn test_set_by_name() {
        let mut params = ConstraintParameters::default();
        params.set("max_gc_content", "0.6").unwrap();
        assert_eq!(params.max_gc_content, 0.6);
        params.set("allow_homopolymers", "yes").unwrap();
        assert!(params.allow_homopolymers);
        params.set("min_repeat_length", "4").unwrap();
        assert_eq!(params.min_repetitive_sequence_length, 4);
    }

    #[test]
    fn test_set_leaves_params_unchanged_on_error() {
        let mut params = ConstraintParameters::default();
        assert!(params.set("max_gc_content", "1.5").is_err());
        assert!(params.set("max_allowed_repetitions", "-1").is_err());
        assert!(params.set("length", "4").is_err());
        assert!(params.set("colour", "blue").is_err());
        assert_eq!(params, ConstraintParameters::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: ConstraintParameters =
            serde_json::from_str(r#"{ "length": 20, "max_gc_content": 0.45 }"#).unwrap();
        assert_eq!(params.length, 20);
        assert_eq!(params.max_gc_content, 0.45);
        assert_eq!(params.max_complementary_bases, DEFAULT_MAX_COMPLEMENTARY_BASES);
    }
}
