//! npm-style version range expressions as accepted by `pragma solidity`.
//!
//! Grammar (whitespace is permitted between any two tokens and around `.`):
//!
//! ```text
//! expression  := alternative ( "||" alternative )*
//! alternative := partial "-" partial | ( operator? partial )+
//! operator    := "^" | "~" | "=" | "<" | "<=" | ">" | ">="
//! partial     := part ( "." part ( "." part )? )? [ "-" pre ] [ "+" build ]
//! part        := number | "x" | "X" | "*"
//! ```
//!
//! Comparators inside an alternative are intersected and the alternatives
//! are unioned. A hyphen range cannot carry operators, and a partial whose
//! wildcard is followed by a concrete component (`1.x.3`) is rejected.

use crate::error::VersionError;
use crate::range::{UpperBound, VersionRange, VersionRanges};
use crate::version::{is_identifier_list, parse_number, SemanticVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Caret,
    Tilde,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A version with possibly missing or wildcard trailing components.
#[derive(Debug, Clone)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    prerelease: Option<String>,
    build: Option<String>,
}

impl Partial {
    fn full(&self) -> SemanticVersion {
        SemanticVersion {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            prerelease: self.prerelease.clone(),
            build: self.build.clone(),
        }
    }
}

#[derive(Debug)]
enum Token {
    Op(Operator),
    Version(Partial),
    Hyphen,
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn err(&self, reason: impl Into<String>) -> VersionError {
        VersionError::expression(self.input, reason)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, VersionError> {
        let mut tokens = Vec::new();
        loop {
            let had_ws = {
                let start = self.pos;
                self.skip_ws();
                self.pos > start
            };
            let Some(b) = self.peek() else { break };
            match b {
                b'^' => {
                    self.pos += 1;
                    tokens.push(Token::Op(Operator::Caret));
                }
                b'~' => {
                    self.pos += 1;
                    tokens.push(Token::Op(Operator::Tilde));
                }
                b'=' => {
                    self.pos += 1;
                    tokens.push(Token::Op(Operator::Eq));
                }
                b'<' | b'>' => {
                    self.pos += 1;
                    let inclusive = self.peek() == Some(b'=');
                    if inclusive {
                        self.pos += 1;
                    }
                    tokens.push(Token::Op(match (b, inclusive) {
                        (b'<', false) => Operator::Lt,
                        (b'<', true) => Operator::Le,
                        (_, false) => Operator::Gt,
                        (_, true) => Operator::Ge,
                    }));
                }
                b'-' => {
                    let after_version = matches!(tokens.last(), Some(Token::Version(_)));
                    if !(had_ws && after_version) {
                        return Err(self.err("unexpected '-'"));
                    }
                    self.pos += 1;
                    tokens.push(Token::Hyphen);
                }
                b'0'..=b'9' | b'x' | b'X' | b'*' => {
                    let partial = self.partial()?;
                    tokens.push(Token::Version(partial));
                }
                other => {
                    return Err(self.err(format!("unexpected character '{}'", other as char)));
                }
            }
        }
        Ok(tokens)
    }

    fn part(&mut self) -> Result<Option<u64>, VersionError> {
        match self.peek() {
            Some(b'x' | b'X' | b'*') => {
                self.pos += 1;
                Ok(None)
            }
            Some(b'0'..=b'9') => {
                let start = self.pos;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
                let text = &self.input[start..self.pos];
                parse_number(text, text)
                    .map(Some)
                    .map_err(|_| self.err(format!("invalid version component '{text}'")))
            }
            _ => Err(self.err("expected a version component")),
        }
    }

    /// Consumes `.` (possibly surrounded by whitespace) if one follows.
    fn dot(&mut self) -> bool {
        let save = self.pos;
        self.skip_ws();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.skip_ws();
            true
        } else {
            self.pos = save;
            false
        }
    }

    fn identifiers(&mut self) -> Result<String, VersionError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
        {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        if is_identifier_list(text) {
            Ok(text.to_string())
        } else {
            Err(self.err(format!("malformed pre-release or build '{text}'")))
        }
    }

    fn partial(&mut self) -> Result<Partial, VersionError> {
        let mut parts = vec![self.part()?];
        while parts.len() < 3 && self.dot() {
            parts.push(self.part()?);
        }

        let mut seen_wildcard = false;
        for p in &parts {
            if p.is_none() {
                seen_wildcard = true;
            } else if seen_wildcard {
                return Err(self.err("a concrete component cannot follow a wildcard"));
            }
        }

        let complete = parts.len() == 3 && parts.iter().all(Option::is_some);
        let mut prerelease = None;
        let mut build = None;
        if self.peek() == Some(b'-')
            && self
                .bytes
                .get(self.pos + 1)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'-')
        {
            if !complete {
                return Err(self.err("pre-release requires a complete version"));
            }
            self.pos += 1;
            prerelease = Some(self.identifiers()?);
        }
        if self.peek() == Some(b'+') {
            if !complete {
                return Err(self.err("build metadata requires a complete version"));
            }
            self.pos += 1;
            build = Some(self.identifiers()?);
        }

        parts.resize(3, None);
        Ok(Partial {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            prerelease,
            build,
        })
    }
}

fn lt(v: SemanticVersion) -> Option<UpperBound> {
    Some(UpperBound {
        version: v,
        inclusive: false,
    })
}

/// Applies a single comparator to a partial version.
fn comparator(
    input: &str,
    op: Operator,
    p: &Partial,
) -> Result<VersionRange, VersionError> {
    let zero = SemanticVersion::zero();
    let Some(major) = p.major else {
        return match op {
            Operator::Eq => Ok(VersionRange::any()),
            _ => Err(VersionError::expression(
                input,
                "operator cannot be applied to a wildcard version",
            )),
        };
    };

    let range = match op {
        Operator::Eq => match (p.minor, p.patch) {
            (None, _) => VersionRange::half_open(p.full(), SemanticVersion::new(major + 1, 0, 0)),
            (Some(minor), None) => {
                VersionRange::half_open(p.full(), SemanticVersion::new(major, minor + 1, 0))
            }
            (Some(_), Some(_)) => VersionRange::exact(p.full()),
        },
        Operator::Caret => {
            let upper = match (p.minor, p.patch) {
                (None, _) => SemanticVersion::new(major + 1, 0, 0),
                _ if major != 0 => SemanticVersion::new(major + 1, 0, 0),
                (Some(minor), None) => SemanticVersion::new(0, minor + 1, 0),
                (Some(0), Some(0)) => {
                    return Err(VersionError::expression(input, "'^0.0.0' matches nothing"))
                }
                (Some(0), Some(patch)) => SemanticVersion::new(0, 0, patch + 1),
                (Some(minor), Some(_)) => SemanticVersion::new(0, minor + 1, 0),
            };
            VersionRange::half_open(p.full(), upper)
        }
        Operator::Tilde => {
            let upper = match p.minor {
                None => SemanticVersion::new(major + 1, 0, 0),
                Some(minor) => SemanticVersion::new(major, minor + 1, 0),
            };
            VersionRange::half_open(p.full(), upper)
        }
        Operator::Lt => VersionRange::new(zero, true, lt(p.full())),
        Operator::Le => match (p.minor, p.patch) {
            (None, _) => VersionRange::new(zero, true, lt(SemanticVersion::new(major + 1, 0, 0))),
            (Some(minor), None) => {
                VersionRange::new(zero, true, lt(SemanticVersion::new(major, minor + 1, 0)))
            }
            _ => VersionRange::new(
                zero,
                true,
                Some(UpperBound {
                    version: p.full(),
                    inclusive: true,
                }),
            ),
        },
        Operator::Gt => match (p.minor, p.patch) {
            (None, _) => VersionRange::at_least(SemanticVersion::new(major + 1, 0, 0)),
            (Some(minor), None) => VersionRange::at_least(SemanticVersion::new(major, minor + 1, 0)),
            _ => VersionRange::new(p.full(), false, None),
        },
        Operator::Ge => VersionRange::at_least(p.full()),
    };
    Ok(range)
}

fn hyphen(lower: &Partial, upper: &Partial) -> VersionRange {
    let lower_range = VersionRange::at_least(lower.full());
    let upper_range = match (upper.major, upper.minor, upper.patch) {
        (None, _, _) => VersionRange::any(),
        (Some(major), None, _) => {
            VersionRange::new(SemanticVersion::zero(), true, lt(SemanticVersion::new(major + 1, 0, 0)))
        }
        (Some(major), Some(minor), None) => VersionRange::new(
            SemanticVersion::zero(),
            true,
            lt(SemanticVersion::new(major, minor + 1, 0)),
        ),
        _ => VersionRange::new(
            SemanticVersion::zero(),
            true,
            Some(UpperBound {
                version: upper.full(),
                inclusive: true,
            }),
        ),
    };
    lower_range.intersect(&upper_range)
}

fn alternative(input: &str, text: &str) -> Result<VersionRange, VersionError> {
    let tokens = Lexer::new(text).tokenize().map_err(|e| match e {
        VersionError::InvalidExpression { reason, .. } => VersionError::expression(input, reason),
        other => other,
    })?;
    if tokens.is_empty() {
        return Err(VersionError::expression(input, "empty alternative"));
    }

    if tokens.iter().any(|t| matches!(t, Token::Hyphen)) {
        return match tokens.as_slice() {
            [Token::Version(a), Token::Hyphen, Token::Version(b)] => Ok(hyphen(a, b)),
            _ => Err(VersionError::expression(
                input,
                "a hyphen range takes exactly two plain versions",
            )),
        };
    }

    let mut range = VersionRange::any();
    let mut pending: Option<Operator> = None;
    for token in &tokens {
        match token {
            Token::Op(op) => {
                if pending.is_some() {
                    return Err(VersionError::expression(input, "two operators in a row"));
                }
                pending = Some(*op);
            }
            Token::Version(p) => {
                let op = pending.take().unwrap_or(Operator::Eq);
                range = range.intersect(&comparator(input, op, p)?);
            }
            Token::Hyphen => unreachable!("hyphen ranges handled above"),
        }
    }
    if pending.is_some() {
        return Err(VersionError::expression(input, "operator without a version"));
    }
    Ok(range)
}

/// Parses a version range expression into a normalized set of ranges.
///
/// An expression can legitimately describe an empty set (`>0.8.0 <0.7.0`);
/// that is not an error.
pub fn parse_expression(input: &str) -> Result<VersionRanges, VersionError> {
    if input.trim().is_empty() {
        return Err(VersionError::expression(input, "empty expression"));
    }
    let mut ranges = Vec::new();
    for alt in input.split("||") {
        ranges.push(alternative(input, alt)?);
    }
    Ok(VersionRanges::new(ranges))
}
