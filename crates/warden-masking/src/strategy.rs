//! Masking strategies and their text transformations.
//!
//! Text strategies work on the character level and never fail, except
//! [`MaskingStrategy::Redact`], which checks that the value has the shape of
//! its [`RedactPattern`] before hiding it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while masking a resource.
#[derive(Debug, Error)]
pub enum MaskingError {
    /// The value does not match the expected pattern for the redact strategy.
    #[error("Value of field '{field}' does not match {pattern:?}: {reason}")]
    PatternMismatch {
        field: String,
        pattern: RedactPattern,
        reason: String,
    },

    /// The strategy cannot be applied to this kind of value.
    #[error("Field '{field}' holds {kind}, which {strategy} cannot mask")]
    Unsupported {
        field: String,
        kind: &'static str,
        strategy: &'static str,
    },

    /// A field mask names no field.
    #[error("Field mask has an empty field path")]
    EmptyField,
}

/// Result type for masking operations.
pub type Result<T> = std::result::Result<T, MaskingError>;

// ---------------------------------------------------------------------------
// Strategy types
// ---------------------------------------------------------------------------

/// Pattern for partial redaction of known data formats.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedactPattern {
    /// SSN: `***-**-6789` (last 4 visible).
    Ssn,
    /// Phone: `***-***-1234` (last 4 visible).
    Phone,
    /// Email: `j***@example.com` (first char + domain visible).
    Email,
    /// Credit card: `****-****-****-1234` (last 4 visible).
    CreditCard,
    /// Fixed replacement string, applied verbatim.
    Custom { replacement: String },
}

/// Strategy used to mask a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskingStrategy {
    /// Pattern-aware partial redaction (e.g. SSN, email).
    Redact(RedactPattern),
    /// SHA-256 one-way hash, hex-encoded.
    Hash,
    /// Deterministic BLAKE3 token prefixed with `tok_` (first 16 hex chars).
    Tokenize,
    /// Keep the first `max_chars` characters, followed by `"..."`.
    Truncate { max_chars: usize },
    /// Keep only the last `chars` characters.
    KeepLast { chars: usize },
    /// Replace the value with JSON `null`.
    Null,
    /// Drop the field from the resource.
    Remove,
}

impl MaskingStrategy {
    /// Short name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Redact(_) => "redact",
            Self::Hash => "hash",
            Self::Tokenize => "tokenize",
            Self::Truncate { .. } => "truncate",
            Self::KeepLast { .. } => "keep-last",
            Self::Null => "null",
            Self::Remove => "remove",
        }
    }

    /// Returns `true` if the strategy replaces the value wholesale instead of
    /// transforming its text.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Null | Self::Remove)
    }

    /// Masks the textual form of a value.
    ///
    /// Structural strategies (`Null`, `Remove`) act on the field rather than
    /// its text; for them this returns an empty string.
    ///
    /// # Errors
    ///
    /// Returns [`MaskingError::PatternMismatch`] when a `Redact` pattern does
    /// not fit `text`. `field` only labels the error.
    pub fn mask_text(&self, field: &str, text: &str) -> Result<String> {
        Ok(match self {
            Self::Redact(pattern) => redact(text, pattern).map_err(|reason| {
                MaskingError::PatternMismatch {
                    field: field.to_string(),
                    pattern: pattern.clone(),
                    reason,
                }
            })?,
            Self::Hash => hash(text),
            Self::Tokenize => tokenize(text),
            Self::Truncate { max_chars } => truncate(text, *max_chars),
            Self::KeepLast { chars } => keep_last(text, *chars),
            Self::Null | Self::Remove => String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Strategy implementations
// ---------------------------------------------------------------------------

/// Applies pattern-based redaction, or explains why the pattern does not fit.
fn redact(text: &str, pattern: &RedactPattern) -> std::result::Result<String, String> {
    match pattern {
        RedactPattern::Ssn => redact_ssn(text),
        RedactPattern::Phone => redact_phone(text),
        RedactPattern::Email => redact_email(text),
        RedactPattern::CreditCard => redact_credit_card(text),
        RedactPattern::Custom { replacement } => Ok(replacement.clone()),
    }
}

fn digits_of(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Redacts SSN: `123-45-6789` -> `***-**-6789`.
fn redact_ssn(text: &str) -> std::result::Result<String, String> {
    // Formatted (XXX-XX-XXXX) and bare (XXXXXXXXX) forms are both accepted
    let digits = digits_of(text);
    if digits.len() != 9 {
        return Err(format!(
            "Expected 9 digits for SSN, found {}",
            digits.len()
        ));
    }

    Ok(format!("***-**-{}", &digits[5..]))
}

/// Redacts phone: `555-123-4567` -> `***-***-4567`.
fn redact_phone(text: &str) -> std::result::Result<String, String> {
    let digits = digits_of(text);
    if digits.len() < 10 {
        return Err(format!(
            "Expected at least 10 digits for phone, found {}",
            digits.len()
        ));
    }

    Ok(format!("***-***-{}", &digits[digits.len() - 4..]))
}

/// Redacts email: `john@example.com` -> `j***@example.com`.
fn redact_email(text: &str) -> std::result::Result<String, String> {
    let Some((local, domain)) = text.split_once('@') else {
        return Err("Invalid email format: missing '@'".to_string());
    };

    let Some(first) = local.chars().next() else {
        return Err("Invalid email format: empty local part".to_string());
    };
    if domain.is_empty() {
        return Err("Invalid email format: empty domain".to_string());
    }

    Ok(format!("{first}***@{domain}"))
}

/// Redacts credit card: `1234-5678-9012-3456` -> `****-****-****-3456`.
fn redact_credit_card(text: &str) -> std::result::Result<String, String> {
    let digits = digits_of(text);
    if !(13..=19).contains(&digits.len()) {
        return Err(format!(
            "Expected 13-19 digits for credit card, found {}",
            digits.len()
        ));
    }

    Ok(format!("****-****-****-{}", &digits[digits.len() - 4..]))
}

/// SHA-256 one-way hash as lowercase hex.
fn hash(text: &str) -> String {
    use sha2::Digest;

    let digest = sha2::Sha256::digest(text.as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();

    debug_assert_eq!(hex.len(), 64, "SHA-256 hex must be 64 characters");
    hex
}

/// `tok_` followed by the first 16 hex characters of the BLAKE3 hash.
fn tokenize(text: &str) -> String {
    let hash = blake3::hash(text.as_bytes());
    let token = format!("tok_{}", &hash.to_hex()[..16]);

    debug_assert_eq!(token.len(), 20, "Token must be exactly 20 characters");
    token
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars).collect();
    format!("{kept}...")
}

fn keep_last(text: &str, chars: usize) -> String {
    let skip = text.chars().count().saturating_sub(chars);
    text.chars().skip(skip).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
