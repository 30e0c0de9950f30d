use std::fmt;
use std::str::FromStr;

use crate::config::MIN_TEMPLATE_HOST_VERSION;
use crate::error::{CompanionError, Result};

/// Dot-separated, non-negative integer version. Ordering is component-wise;
/// on a shared-prefix tie the longer version is the higher one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version(Vec<u64>);

impl FromStr for Version {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self> {
        let components = s
            .split('.')
            .map(|part| part.trim().parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| CompanionError::InvalidVersion(s.to_string()))?;
        Ok(Version(components))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Return whichever of `v1` / `v2` is higher; `v1` wins a full tie.
pub fn higher_version<'a>(v1: &'a str, v2: &'a str) -> Result<&'a str> {
    let (a, b) = (v1.parse::<Version>()?, v2.parse::<Version>()?);
    Ok(if a >= b { v1 } else { v2 })
}

/// Whether the legacy template path is gated off for a host at `current`:
/// true once the host runs a version strictly above `minimum`.
/// Unreadable versions keep the gate closed.
pub fn templates_suppressed_above(current: &str, minimum: &str) -> bool {
    match (current.parse::<Version>(), minimum.parse::<Version>()) {
        (Ok(current), Ok(minimum)) => current > minimum,
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(error = %err, "cannot compare host version, suppressing legacy templates");
            true
        }
    }
}

pub fn is_legacy_templates_suppressed(current: &str) -> bool {
    templates_suppressed_above(current, MIN_TEMPLATE_HOST_VERSION)
}
