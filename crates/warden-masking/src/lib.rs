//! # warden-masking: Field-level resource masking
//!
//! Turns a list of field masks into a [`Mapper`](warden_abac::Mapper), so an
//! `Allow` rule can hand back a resource with its sensitive fields hidden.
//!
//! ## Strategies
//!
//! | Strategy   | Result for `"123-45-6789"`                  |
//! |------------|---------------------------------------------|
//! | Redact     | `***-**-6789` (pattern-aware)               |
//! | Hash       | 64-char SHA-256 hex                         |
//! | Tokenize   | `tok_` + 16 hex chars of BLAKE3             |
//! | Truncate   | first N characters + `...`                  |
//! | KeepLast   | last N characters (`6789`)                  |
//! | Null       | JSON `null`                                 |
//! | Remove     | field dropped                               |
//!
//! ## Examples
//!
//! ```
//! use serde_json::json;
//! use warden_abac::{AccessRequest, AccessRule, Authorizer};
//! use warden_masking::{FieldMask, MaskingPolicy, MaskingStrategy};
//!
//! let policy = MaskingPolicy::new()
//!     .with_mask(FieldMask::new("ssn", MaskingStrategy::KeepLast { chars: 4 }));
//!
//! let authz = Authorizer::new(vec![
//!     AccessRule::allow()
//!         .with_filter(|rt, _| rt == Some("person"))
//!         .with_shared_mapper(policy.into_mapper()),
//! ])
//! .without_decision_log();
//!
//! let request = AccessRequest::new(
//!     json!({"type": "read"}),
//!     json!({"type": "person", "firstname": "John", "ssn": "123456789"}),
//! );
//!
//! let resource = authz.enforce(&request, None)?.into_resource().unwrap();
//! assert_eq!(resource["ssn"], "6789");
//! assert_eq!(resource["firstname"], "John");
//! # Ok::<(), warden_abac::EvaluationError>(())
//! ```

pub mod policy;
pub mod strategy;

pub use policy::{FieldMask, MaskingPolicy};
pub use strategy::{MaskingError, MaskingStrategy, RedactPattern, Result};
