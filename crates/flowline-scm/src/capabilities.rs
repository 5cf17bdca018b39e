//! Toolkit version identity and version-gated feature capabilities.
//!
//! The connected build toolkit advertises what it can do through an explicit
//! [`Capabilities`] value returned by the client, rather than the caller
//! probing for optional interfaces at runtime. Feature gates compare against
//! named minimum versions so error messages can always cite the version a
//! feature first shipped in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Minimum toolkit version for load-rule-file driven loads.
pub const MIN_LOAD_POLICY_TOOLKIT: ToolkitVersion = ToolkitVersion::new(6, 0, 3);

/// Minimum toolkit version for dynamic load rules.
pub const MIN_DYNAMIC_LOAD_RULES_TOOLKIT: ToolkitVersion = ToolkitVersion::new(6, 0, 3);

/// A dotted toolkit version (`major.minor.micro`), ordered numerically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolkitVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl ToolkitVersion {
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl fmt::Display for ToolkitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

impl FromStr for ToolkitVersion {
    type Err = ClientError;

    /// Parse `"6.0.3"` (or the short forms `"6.0"` / `"6"`; missing segments
    /// are zero). Anything non-numeric is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = [0u32; 3];
        let mut count = 0;
        for part in s.trim().split('.') {
            if count == 3 {
                return Err(ClientError::InvalidVersion(s.to_string()));
            }
            segments[count] = part
                .parse::<u32>()
                .map_err(|_| ClientError::InvalidVersion(s.to_string()))?;
            count += 1;
        }
        Ok(ToolkitVersion::new(segments[0], segments[1], segments[2]))
    }
}

/// What the connected toolkit/server combination supports.
///
/// Returned by [`crate::ScmClient::capabilities`] once per operation; the
/// decision engines gate version-dependent features on this value instead of
/// discovering missing interfaces mid-operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capabilities {
    /// Version the build toolkit reports for itself.
    pub toolkit_version: ToolkitVersion,
}

impl Capabilities {
    pub fn new(toolkit_version: ToolkitVersion) -> Self {
        Self { toolkit_version }
    }

    /// Whether load-rule-file driven loads are available.
    pub fn supports_load_policy(&self) -> bool {
        self.toolkit_version >= MIN_LOAD_POLICY_TOOLKIT
    }

    /// Whether dynamic load rules are available.
    pub fn supports_dynamic_load_rules(&self) -> bool {
        self.toolkit_version >= MIN_DYNAMIC_LOAD_RULES_TOOLKIT
    }
}
