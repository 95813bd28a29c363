//! Decision and access-mode types shared with broker auth plugins.
//!
//! The cache treats decisions as opaque values, but most callers speak the
//! broker's integer result codes. These types give those codes names while
//! still round-tripping anything the broker hands over.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broker result code for a granted request.
pub const RESULT_SUCCESS: i32 = 0;

/// Broker result code for a denied ACL check.
pub const RESULT_ACL_DENIED: i32 = 12;

/// Broker result code meaning "no answer".
pub const RESULT_UNKNOWN: i32 = 13;

/// Outcome of an authentication or authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The request is granted.
    Allow,
    /// The request is refused.
    Deny,
    /// The backend had no opinion.
    Unknown,
    /// Any other broker-specific code, passed through unchanged.
    Other(i32),
}

impl Decision {
    /// Returns the broker result code for this decision.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Allow => RESULT_SUCCESS,
            Self::Deny => RESULT_ACL_DENIED,
            Self::Unknown => RESULT_UNKNOWN,
            Self::Other(code) => code,
        }
    }
}

impl From<i32> for Decision {
    fn from(code: i32) -> Self {
        match code {
            RESULT_SUCCESS => Self::Allow,
            RESULT_ACL_DENIED => Self::Deny,
            RESULT_UNKNOWN => Self::Unknown,
            other => Self::Other(other),
        }
    }
}

impl From<Decision> for i32 {
    fn from(decision: Decision) -> Self {
        decision.code()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
            Self::Unknown => write!(f, "unknown"),
            Self::Other(code) => write!(f, "code({code})"),
        }
    }
}

/// Operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Receive messages on a topic.
    Read,
    /// Publish to a topic.
    Write,
    /// Subscribe to a topic filter.
    Subscribe,
    /// Any other broker-specific access flag.
    Other(i32),
}

impl AccessMode {
    /// Returns the integer tag mixed into the cache key.
    #[must_use]
    pub fn tag(self) -> i32 {
        match self {
            Self::Read => 1,
            Self::Write => 2,
            Self::Subscribe => 4,
            Self::Other(tag) => tag,
        }
    }
}

impl From<i32> for AccessMode {
    fn from(tag: i32) -> Self {
        match tag {
            1 => Self::Read,
            2 => Self::Write,
            4 => Self::Subscribe,
            other => Self::Other(other),
        }
    }
}

impl From<AccessMode> for i32 {
    fn from(mode: AccessMode) -> Self {
        mode.tag()
    }
}
