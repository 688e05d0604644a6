use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

static POSTAL_CODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{1,10}[A-Za-z0-9]$")
        .expect("Failed to compile postal code regex - this is a bug in the code")
});

/// A postal code, the unit of scheduled work.
///
/// Codes are trimmed and upper-cased on parse so `"sw1a 1aa"` and
/// `"SW1A 1AA "` address the same work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parses and normalizes a postal code.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim();
        if cleaned.is_empty() {
            return Err(ValidationError::EmptyField("postal code"));
        }
        if !POSTAL_CODE_REGEX.is_match(cleaned) {
            return Err(ValidationError::InvalidPostalCode(cleaned.to_string()));
        }
        Ok(Self(cleaned.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a group of postal codes (a district, for example).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupName(String);

impl GroupName {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("group name"));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidGroupName(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Label that groups are filed under (a state or region).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentLabel(String);

impl ParentLabel {
    pub fn new(label: impl Into<String>) -> Result<Self, ValidationError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("parent label"));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidParentLabel(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one discovery session in logs and observer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short form used in log lines.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

macro_rules! string_serde {
    ($ty:ty, $ctor:expr) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                ($ctor)(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(PostalCode, PostalCode::parse);
string_serde!(GroupName, |s: &str| GroupName::new(s));
string_serde!(ParentLabel, |s: &str| ParentLabel::new(s));
