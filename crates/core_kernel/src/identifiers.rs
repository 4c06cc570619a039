//! Strongly-typed identifiers for admission entities
//!
//! Identifiers are assigned by upstream systems (admission desk, settlement
//! procedure) and arrive as raw strings that may carry surrounding whitespace
//! from fixed-width legacy columns. Every identifier is trimmed on
//! construction so that it can be used directly as a storage key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when a raw string cannot form an identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The value was empty once surrounding whitespace was removed
    #[error("{kind} must not be blank")]
    Blank { kind: &'static str },
}

macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses a raw value, trimming surrounding whitespace
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, IdentifierError> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(IdentifierError::Blank { kind: $kind });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the trimmed identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Human readable name of the identifier kind
            pub fn kind() -> &'static str {
                $kind
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(EpisodeId, "episode id");
define_id!(PatientId, "patient id");
define_id!(AccountId, "account id");
define_id!(OperatorId, "operating user");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims() {
        let id = EpisodeId::parse("  H-1001 ").unwrap();
        assert_eq!(id.as_str(), "H-1001");
        assert_eq!(id.to_string(), "H-1001");
    }

    #[test]
    fn test_blank_rejected() {
        let err = PatientId::parse("   ").unwrap_err();
        assert_eq!(err, IdentifierError::Blank { kind: "patient id" });
        assert!(err.to_string().contains("patient id"));
    }

    #[test]
    fn test_serde_goes_through_parse() {
        let id: AccountId = serde_json::from_str("\" A900\"").unwrap();
        assert_eq!(id.as_str(), "A900");
        assert!(serde_json::from_str::<AccountId>("\"\"").is_err());
    }
}
