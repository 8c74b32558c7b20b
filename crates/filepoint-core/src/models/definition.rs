//! Definition tag: the rendering tier a strategy can produce for a file.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Definition {
    Low,
    Medium,
    High,
}

impl Definition {
    /// Ordinal used by [`closest_definition`] distance/tie-break math.
    fn ordinal(self) -> i32 {
        match self {
            Definition::Low => 0,
            Definition::Medium => 1,
            Definition::High => 2,
        }
    }

    /// The object-key suffix for this tier, e.g. `low-def`.
    pub fn suffix(self) -> &'static str {
        match self {
            Definition::Low => "low-def",
            Definition::Medium => "medium-def",
            Definition::High => "high-def",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Definition::Low => "low",
            Definition::Medium => "medium",
            Definition::High => "high",
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Definition {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Definition::Low),
            "medium" => Ok(Definition::Medium),
            "high" => Ok(Definition::High),
            other => Err(crate::AppError::InvalidInput(format!(
                "unknown definition '{other}'"
            ))),
        }
    }
}

/// Resolves `requested` against the set of `available` definitions (§8
/// invariant 4, Open Question #1): exact match if present, else nearest by
/// ordinal distance, ties broken to the higher definition. Clamps to the
/// smallest available when `requested` is below every available tier — see
/// SPEC_FULL.md §9 Open Question #1. Returns `None` only if `available` is empty.
pub fn closest_definition(available: &[Definition], requested: Definition) -> Option<Definition> {
    if available.contains(&requested) {
        return Some(requested);
    }

    available
        .iter()
        .copied()
        .min_by_key(|d| {
            let distance = (d.ordinal() - requested.ordinal()).abs();
            // Tie-break upward: among equal distances, prefer the higher ordinal,
            // so negate the ordinal to make `min_by_key` prefer it.
            (distance, -d.ordinal())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins() {
        let avail = [Definition::Low, Definition::High];
        assert_eq!(
            closest_definition(&avail, Definition::Low),
            Some(Definition::Low)
        );
    }

    #[test]
    fn tie_breaks_upward() {
        let avail = [Definition::Low, Definition::High];
        assert_eq!(
            closest_definition(&avail, Definition::Medium),
            Some(Definition::High)
        );
    }

    #[test]
    fn clamps_below_smallest() {
        let avail = [Definition::Medium, Definition::High];
        assert_eq!(
            closest_definition(&avail, Definition::Low),
            Some(Definition::Medium)
        );
    }
}
