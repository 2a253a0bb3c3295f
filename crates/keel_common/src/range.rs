//! Version intervals and normalized sets of intervals.

use crate::error::VersionError;
use crate::version::SemanticVersion;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The upper end of a [`VersionRange`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UpperBound {
    /// The bounding version.
    pub version: SemanticVersion,
    /// Whether `version` itself is part of the range.
    pub inclusive: bool,
}

/// A contiguous interval of versions with an optional upper bound.
///
/// Ranges whose lower bound exceeds the upper bound (or that meet at a single
/// excluded point) are empty. An empty range keeps the bounds it was built
/// from, so test emptiness with [`is_empty`](Self::is_empty) rather than by
/// comparing against [`empty`](Self::empty).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionRange {
    lower: SemanticVersion,
    lower_inclusive: bool,
    upper: Option<UpperBound>,
}

impl VersionRange {
    /// Creates a range from its bounds.
    pub fn new(lower: SemanticVersion, lower_inclusive: bool, upper: Option<UpperBound>) -> Self {
        Self {
            lower,
            lower_inclusive,
            upper,
        }
    }

    /// The universal range `>=0.0.0`.
    pub fn any() -> Self {
        Self::at_least(SemanticVersion::zero())
    }

    /// The empty range `>0.0.0 <0.0.0`.
    pub fn empty() -> Self {
        Self {
            lower: SemanticVersion::zero(),
            lower_inclusive: false,
            upper: Some(UpperBound {
                version: SemanticVersion::zero(),
                inclusive: false,
            }),
        }
    }

    /// `>=v`.
    pub fn at_least(v: SemanticVersion) -> Self {
        Self::new(v, true, None)
    }

    /// `>=lower <upper`.
    pub fn half_open(lower: SemanticVersion, upper: SemanticVersion) -> Self {
        Self::new(
            lower,
            true,
            Some(UpperBound {
                version: upper,
                inclusive: false,
            }),
        )
    }

    /// `=v`, a range containing exactly one version.
    pub fn exact(v: SemanticVersion) -> Self {
        Self::new(
            v.clone(),
            true,
            Some(UpperBound {
                version: v,
                inclusive: true,
            }),
        )
    }

    /// Returns the lower bound.
    pub fn lower(&self) -> &SemanticVersion {
        &self.lower
    }

    /// Returns whether the lower bound is inclusive.
    pub fn lower_inclusive(&self) -> bool {
        self.lower_inclusive
    }

    /// Returns the upper bound, if any.
    pub fn upper(&self) -> Option<&UpperBound> {
        self.upper.as_ref()
    }

    /// Returns `true` if no version lies in the range.
    pub fn is_empty(&self) -> bool {
        match &self.upper {
            Some(u) => match self.lower.cmp(&u.version) {
                Ordering::Greater => true,
                Ordering::Equal => !(self.lower_inclusive && u.inclusive),
                Ordering::Less => false,
            },
            None => false,
        }
    }

    /// Returns `true` if `v` lies in the range.
    pub fn contains(&self, v: &SemanticVersion) -> bool {
        if self.is_empty() {
            return false;
        }
        let lower_ok = if self.lower_inclusive {
            *v >= self.lower
        } else {
            *v > self.lower
        };
        if !lower_ok {
            return false;
        }
        match &self.upper {
            Some(u) if u.inclusive => *v <= u.version,
            Some(u) => *v < u.version,
            None => true,
        }
    }

    /// Intersects two ranges. On equal bounds the exclusive one wins.
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        let (lower, lower_inclusive) = match self.lower.cmp(&other.lower) {
            Ordering::Greater => (self.lower.clone(), self.lower_inclusive),
            Ordering::Less => (other.lower.clone(), other.lower_inclusive),
            Ordering::Equal => (
                self.lower.clone(),
                self.lower_inclusive && other.lower_inclusive,
            ),
        };
        let upper = match (&self.upper, &other.upper) {
            (None, None) => None,
            (Some(u), None) | (None, Some(u)) => Some(u.clone()),
            (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
                Ordering::Less => a.clone(),
                Ordering::Greater => b.clone(),
                Ordering::Equal => UpperBound {
                    version: a.version.clone(),
                    inclusive: a.inclusive && b.inclusive,
                },
            }),
        };
        VersionRange::new(lower, lower_inclusive, upper)
    }

    /// Returns `true` if `self` and a range starting at or after it share or
    /// touch a bound, so that their union is a single interval.
    fn joins(&self, next: &VersionRange) -> bool {
        match &self.upper {
            None => true,
            Some(u) => match next.lower.cmp(&u.version) {
                Ordering::Less => true,
                Ordering::Equal => u.inclusive || next.lower_inclusive,
                Ordering::Greater => false,
            },
        }
    }

    /// Orders two upper bounds, with `None` as unbounded.
    fn max_upper(a: &Option<UpperBound>, b: &Option<UpperBound>) -> Option<UpperBound> {
        match (a, b) {
            (None, _) | (_, None) => None,
            (Some(x), Some(y)) => Some(match x.version.cmp(&y.version) {
                Ordering::Greater => x.clone(),
                Ordering::Less => y.clone(),
                Ordering::Equal => UpperBound {
                    version: x.version.clone(),
                    inclusive: x.inclusive || y.inclusive,
                },
            }),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.lower_inclusive { ">=" } else { ">" };
        write!(f, "{op}{}", self.lower)?;
        if let Some(u) = &self.upper {
            let op = if u.inclusive { "<=" } else { "<" };
            write!(f, " {op}{}", u.version)?;
        }
        Ok(())
    }
}

/// A union of version ranges kept sorted, disjoint and non-adjacent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct VersionRanges {
    ranges: Vec<VersionRange>,
}

impl VersionRanges {
    /// Builds the union of `ranges`, dropping empties and merging overlaps.
    pub fn new(ranges: impl IntoIterator<Item = VersionRange>) -> Self {
        let mut items: Vec<VersionRange> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        items.sort_by(|a, b| {
            a.lower
                .cmp(&b.lower)
                .then_with(|| b.lower_inclusive.cmp(&a.lower_inclusive))
        });

        let mut merged: Vec<VersionRange> = Vec::with_capacity(items.len());
        for range in items {
            match merged.last_mut() {
                Some(last) if last.joins(&range) => {
                    last.upper = VersionRange::max_upper(&last.upper, &range.upper);
                }
                _ => merged.push(range),
            }
        }
        Self { ranges: merged }
    }

    /// The set of every version.
    pub fn any() -> Self {
        Self {
            ranges: vec![VersionRange::any()],
        }
    }

    /// The empty set.
    pub fn none() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Returns the normalized member ranges.
    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    /// Returns `true` if no version is contained.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `true` if any member range contains `v`.
    pub fn contains(&self, v: &SemanticVersion) -> bool {
        self.ranges.iter().any(|r| r.contains(v))
    }

    /// Pairwise intersection of two sets.
    pub fn intersect(&self, other: &VersionRanges) -> VersionRanges {
        let mut out = Vec::new();
        for a in &self.ranges {
            for b in &other.ranges {
                let r = a.intersect(b);
                if !r.is_empty() {
                    out.push(r);
                }
            }
        }
        VersionRanges::new(out)
    }

    /// Union of two sets.
    pub fn union(&self, other: &VersionRanges) -> VersionRanges {
        VersionRanges::new(self.ranges.iter().chain(other.ranges.iter()).cloned())
    }

    /// The lowest lower bound, or `None` for the empty set.
    pub fn lowest(&self) -> Option<&SemanticVersion> {
        self.ranges.first().map(|r| &r.lower)
    }

    /// The upper bound of the first member range; `None` when unbounded or empty.
    pub fn first_upper(&self) -> Option<&SemanticVersion> {
        self.ranges
            .first()
            .and_then(|r| r.upper.as_ref())
            .map(|u| &u.version)
    }
}

impl From<VersionRange> for VersionRanges {
    fn from(range: VersionRange) -> Self {
        VersionRanges::new([range])
    }
}

impl fmt::Display for VersionRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return f.write_str("<none>");
        }
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}

impl FromStr for VersionRanges {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::expr::parse_expression(s)
    }
}

impl Serialize for VersionRanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRanges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "<none>" {
            return Ok(VersionRanges::none());
        }
        s.parse().map_err(serde::de::Error::custom)
    }
}
