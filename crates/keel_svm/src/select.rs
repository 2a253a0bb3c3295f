//! Choosing the compiler release for a compilation unit.

use keel_common::{SemanticVersion, VersionRanges};

/// Why no compiler release could be chosen for a unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The configured target version is outside the unit's pragmas.
    #[error("target version {target} does not satisfy {versions}")]
    TargetVersionOutsideRange {
        /// The configured target.
        target: SemanticVersion,
        /// The unit's allowed versions.
        versions: VersionRanges,
    },

    /// No release satisfies the unit's pragmas.
    #[error("no solc release satisfies {versions}")]
    NoMatchingVersion {
        /// The unit's allowed versions.
        versions: VersionRanges,
    },

    /// Every matching release is newer than the configured maximum.
    #[error("every solc release satisfying {versions} is above the maximum {max}")]
    AboveMaximum {
        /// The unit's allowed versions.
        versions: VersionRanges,
        /// The configured maximum.
        max: SemanticVersion,
    },

    /// The newest usable release is older than the configured minimum.
    #[error("solc {selected} is below the minimum supported version {min}")]
    BelowMinimum {
        /// The release that would have been chosen.
        selected: SemanticVersion,
        /// The configured minimum.
        min: SemanticVersion,
    },
}

/// Picks the release to compile a unit accepting `versions` with.
///
/// A pinned `target` is used as is when the unit accepts it. Otherwise the
/// newest of `available` that the unit accepts and that does not exceed
/// `max` is chosen, provided it is at least `min`.
pub fn select_version(
    versions: &VersionRanges,
    available: &[SemanticVersion],
    target: Option<&SemanticVersion>,
    min: &SemanticVersion,
    max: &SemanticVersion,
) -> Result<SemanticVersion, SelectionError> {
    if let Some(target) = target {
        if !versions.contains(target) {
            return Err(SelectionError::TargetVersionOutsideRange {
                target: target.clone(),
                versions: versions.clone(),
            });
        }
        return Ok(target.clone());
    }

    let mut matching = available.iter().filter(|v| versions.contains(v)).peekable();
    if matching.peek().is_none() {
        return Err(SelectionError::NoMatchingVersion {
            versions: versions.clone(),
        });
    }
    let selected = matching
        .filter(|v| *v <= max)
        .max()
        .ok_or_else(|| SelectionError::AboveMaximum {
            versions: versions.clone(),
            max: max.clone(),
        })?;
    if selected < min {
        return Err(SelectionError::BelowMinimum {
            selected: selected.clone(),
            min: min.clone(),
        });
    }
    Ok(selected.clone())
}
