//! Field attribute validation.
//!
//! Record identity and the auth token are configuration: a field carrying a
//! bad value for either is disabled for the rest of the session. The order
//! value is operator input and can always be retried.

use std::fmt;
use std::num::NonZeroU64;

pub const MSG_INVALID_RECORD_ID: &str = "The post_id is invalid.";
pub const MSG_INVALID_AUTH_TOKEN: &str = "The postNonce is invalid.";
pub const MSG_MISSING_CONTEXT: &str =
    "Invalid installation: record type or request endpoint is not initialized.";
pub const MSG_INVALID_VALUE: &str = "The menu order value is invalid.";

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Positive integer identifying the record a field reorders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(NonZeroU64);

impl RecordId {
    /// `None` for zero.
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    /// Parse the raw attribute the view rendered for the field.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        raw.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or(ConfigError::InvalidRecordId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

/// Opaque anti-forgery token bound to one field.
///
/// Only presence is checked. The contents are never inspected and never
/// printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw {
            Some(t) if !t.trim().is_empty() => Ok(Self(t.to_string())),
            _ => Err(ConfigError::MissingAuthToken),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(REDACTED)")
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A configuration problem that permanently disables a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigError {
    InvalidRecordId,
    MissingAuthToken,
    /// Record type or request endpoint absent from the controller config.
    MissingContext,
}

impl ConfigError {
    /// Operator-facing explanation, shown as the field's tooltip.
    pub fn message(self) -> &'static str {
        match self {
            ConfigError::InvalidRecordId => MSG_INVALID_RECORD_ID,
            ConfigError::MissingAuthToken => MSG_INVALID_AUTH_TOKEN,
            ConfigError::MissingContext => MSG_MISSING_CONTEXT,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ConfigError {}

/// Operator input that does not parse as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub raw: String,
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MSG_INVALID_VALUE} (got {:?})", self.raw)
    }
}

impl std::error::Error for InvalidValue {}

// ---------------------------------------------------------------------------
// Order value
// ---------------------------------------------------------------------------

/// Parse a menu order typed by the operator.
///
/// Surrounding whitespace is ignored. The text must be a plain decimal
/// number (`[+-]digits[.digits][e[+-]digits]`); its integer part is the
/// value, so `"7.9"` is 7 and `"1e3"` is 1. Anything outside the `i64`
/// range is invalid rather than clamped.
pub fn parse_order_value(raw: &str) -> Result<i64, InvalidValue> {
    let invalid = || InvalidValue {
        raw: raw.to_string(),
    };

    let t = raw.trim();
    let body = t.strip_prefix(['+', '-']).unwrap_or(t);
    let sign_len = t.len() - body.len();

    let int_len = leading_digits(body);
    if int_len == 0 {
        return Err(invalid());
    }
    let mut rest = &body[int_len..];

    if let Some(frac) = rest.strip_prefix('.') {
        rest = &frac[leading_digits(frac)..];
    }
    if let Some(exp) = rest.strip_prefix(['e', 'E']) {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        let n = leading_digits(exp);
        if n == 0 {
            return Err(invalid());
        }
        rest = &exp[n..];
    }
    if !rest.is_empty() {
        return Err(invalid());
    }

    t[..sign_len + int_len].parse().map_err(|_| invalid())
}

fn leading_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}
