//! Capture session identifier

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

/// Why a string cannot name a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidSessionId {
    #[error("session id cannot be empty")]
    Empty,
    #[error("session id cannot contain a path separator")]
    PathSeparator,
    #[error("session id cannot contain '..'")]
    ParentDir,
}

/// Name of one capture session, e.g. `advio-08`.
///
/// The id is joined onto the dataset root as the session directory and
/// prefixes every relocated frame, so it has to stay a single path
/// component. Clones share one allocation.
///
/// ```
/// use contracts::SessionId;
///
/// let id = SessionId::parse("advio-08").unwrap();
/// assert_eq!(id.frame_name("17", "jpg"), "advio-08_17.jpg");
/// assert!(SessionId::parse("../advio-08").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct SessionId(Arc<str>);

impl SessionId {
    /// Checked constructor, used for everything read from configuration
    pub fn parse(s: &str) -> Result<Self, InvalidSessionId> {
        if s.trim().is_empty() {
            return Err(InvalidSessionId::Empty);
        }
        if s.contains(['/', '\\']) {
            return Err(InvalidSessionId::PathSeparator);
        }
        if s.contains("..") {
            return Err(InvalidSessionId::ParentDir);
        }
        Ok(Self(Arc::from(s)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of a frame once it has been attributed to this session
    pub fn frame_name(&self, frame_id: &str, extension: &str) -> String {
        format!("{}_{}.{}", self.0, frame_id, extension)
    }
}

impl Deref for SessionId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unchecked, for ids that never came from user input
impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl TryFrom<String> for SessionId {
    type Error = InvalidSessionId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SessionId {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialEq<String> for SessionId {
    fn eq(&self, other: &String) -> bool {
        &*self.0 == other.as_str()
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
