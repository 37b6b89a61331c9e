use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do when the target (local file or published datasource) exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Fail before anything is written.
    #[default]
    Abort,
    /// Replace the existing target.
    Overwrite,
    /// Append rows to the existing target.
    Append,
}

impl OverwritePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::Overwrite => "overwrite",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown overwrite policy: {0} (expected abort, overwrite or append)")]
pub struct ParsePolicyError(pub String);

impl FromStr for OverwritePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}
