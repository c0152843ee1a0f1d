use std::fmt;

/// Errors raised while building a validator.
///
/// Evaluating a group never fails with a `GateError`; rejections are
/// decisions (see [`crate::RejectCause`]).
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Membership terms are inconsistent.
    #[error("invalid membership terms: {0}")]
    InvalidTerms(String),

    /// Terms could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for GateError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl PartialEq for GateError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

impl Eq for GateError {}
