// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The rule engine: values, matches, rules, filters, and the parser
//! that produces them.
pub mod cursor;
pub mod filter;
pub mod predicate;
pub mod rule;
pub mod tc;
pub mod value;

pub use filter::Filter;
pub use predicate::CompOperator;
pub use predicate::Match;
pub use predicate::MatchFlags;
pub use predicate::MatchType;
pub use rule::Action;
pub use rule::Rule;
pub use rule::RuleError;
pub use tc::ParseError;
pub use value::Value;
pub use value::ValueFormat;
