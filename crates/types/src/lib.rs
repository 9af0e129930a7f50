//! # Swastha Types
//!
//! Validated value types shared by the Swastha crates.

/// Longest identifier accepted from a scanned payload.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Errors that can occur when creating a [`PatientIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The input was empty or contained only whitespace
    #[error("patient identifier cannot be empty")]
    Empty,
    /// The input was longer than [`MAX_IDENTIFIER_LEN`]
    #[error("patient identifier exceeds maximum length of {MAX_IDENTIFIER_LEN} characters")]
    TooLong,
    /// The input contained a control character or a path separator, or was a dot segment
    #[error("patient identifier contains invalid characters")]
    InvalidCharacters,
}

/// The identifier of the patient whose record a lookup fetches.
///
/// Identifiers come from scanned QR payloads, whose format this system does not control, and
/// end up as a URL path segment. Construction trims surrounding whitespace and rejects values
/// that are empty, longer than [`MAX_IDENTIFIER_LEN`], contain control characters or `/`, or
/// are exactly `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatientIdentifier(String);

impl PatientIdentifier {
    /// Creates a new `PatientIdentifier` from the given input.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentifierError`] describing why the trimmed input was rejected.
    pub fn new(input: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong);
        }
        // `.` and `..` are dropped or resolved as URL path segments.
        if matches!(trimmed, "." | "..") || trimmed.chars().any(|c| c.is_control() || c == '/')
        {
            return Err(IdentifierError::InvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatientIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PatientIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for PatientIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for PatientIdentifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientIdentifier::new(&s).map_err(serde::de::Error::custom)
    }
}
