use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse {kind} from string")]
pub struct ParseIdError {
    kind: &'static str,
}

impl ParseIdError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            /// Creates a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn value(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map($name::new)
                    .map_err(|_| ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a purchased package.
    PackageId
);
uuid_id!(
    /// Unique identifier for a redemption record.
    RedemptionId
);
uuid_id!(
    /// Unique identifier for a booking owned by the backend.
    BookingId
);
uuid_id!(StudentId);
uuid_id!(TeacherId);
uuid_id!(SubjectId);

// ─── Readable IDs ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ReadableIdError {
    #[error("readable id is empty")]
    Empty,
    #[error("readable id contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Human-facing reference such as `PKG-2412-1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReadableId(String);

impl ReadableId {
    /// Validates a readable id.
    ///
    /// # Errors
    ///
    /// Returns `ReadableIdError` if the value is blank or contains anything other
    /// than ASCII upper-case letters, digits and `-`.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ReadableIdError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ReadableIdError::Empty);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(ReadableIdError::InvalidChar(bad));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReadableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReadableId {
    type Error = ReadableIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ReadableId> for String {
    fn from(value: ReadableId) -> Self {
        value.0
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
