// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Rules: an ordered set of matches and the action to take when they
//! all hold.

use super::predicate::Match;
use super::predicate::MatchType;
use super::tc::ParseError;
use super::value::ValueFormat;
use alloc::string::String;
use core::fmt;
use core::fmt::Display;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// The most matches a single rule may hold.
pub const MAX_MATCHES_PER_RULE: usize = 5;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("a rule needs 1 to 5 matches, found {0}")]
    BadMatchCount(usize),

    #[error("unspecified match in rule")]
    UnspecMatch,

    #[error("{kind} cannot carry a {found} value")]
    FormatMismatch { kind: MatchType, found: ValueFormat },

    #[error("bad value: {0}")]
    BadValue(String),

    #[error("range upper bound is below its lower bound")]
    BadRange,

    #[error("index {index} is out of bounds for a filter of {len} rules")]
    BadIndex { index: usize, len: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("bad saved filter: {0}")]
    Json(String),
}

/// What to do with a packet matching every criterion of a rule.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Action {
    Pass,
    Drop,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Self::Pass),
            "drop" => Ok(Self::Drop),
            _ => Err(format!("bad action: {s}")),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Drop => "drop",
        };
        write!(f, "{s}")
    }
}

/// A validated rule.
///
/// Matches keep the order they were given in. A rule is never
/// modified once built.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rule {
    matches: heapless::Vec<Match, MAX_MATCHES_PER_RULE>,
    action: Action,
}

impl Rule {
    pub fn new(matches: &[Match], action: Action) -> Result<Self, RuleError> {
        if matches.is_empty() {
            return Err(RuleError::BadMatchCount(0));
        }

        let matches = heapless::Vec::from_slice(matches)
            .map_err(|_| RuleError::BadMatchCount(matches.len()))?;
        let rule = Self { matches, action };
        rule.validate()?;
        Ok(rule)
    }

    /// Assemble a rule from matches already checked by the caller.
    pub(crate) fn from_parts(
        matches: heapless::Vec<Match, MAX_MATCHES_PER_RULE>,
        action: Action,
    ) -> Self {
        Self { matches, action }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Check every match of the rule.
    ///
    /// Needed for rules which did not come through [`Rule::new`], such
    /// as those read back from a saved filter.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.matches.is_empty() {
            return Err(RuleError::BadMatchCount(0));
        }

        self.matches.iter().try_for_each(Match::validate)
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for m in &self.matches {
            write!(f, "{m}, ")?;
        }
        write!(f, "action {}", self.action)
    }
}
