use std::{fmt, str::FromStr};

use crate::err::{bail, Context, Error, Result};

/// A version reported by the backing cluster, ordered by release
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    /// Parses a dotted version string, eg "0.57.8" or "2.0"
    fn from_str(version: &str) -> Result<Self> {
        let segments = version.trim().split('.').collect::<Vec<_>>();

        if segments.len() > 3 {
            bail!("Invalid version string '{version}'");
        }

        let mut nums = [0u32; 3];
        for (idx, segment) in segments.iter().enumerate() {
            nums[idx] = segment
                .parse()
                .with_context(|| format!("Invalid version string '{version}'"))?;
        }

        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
