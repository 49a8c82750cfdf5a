// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! An ordered collection of rules.

use super::rule::Rule;
use super::rule::RuleError;
use super::tc;
#[cfg(feature = "std")]
use alloc::string::String;
#[cfg(feature = "std")]
use alloc::string::ToString;
use alloc::vec::Vec;
use serde::Deserialize;
use serde::Serialize;

/// The rules of a filter, in priority order: a rule earlier in the
/// list is evaluated before every rule after it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Filter {
    rules: Vec<Rule>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. `None` appends it, `Some(index)` inserts it before
    /// the rule currently at `index`.
    pub fn add_rule(
        &mut self,
        rule: Rule,
        index: Option<usize>,
    ) -> Result<(), RuleError> {
        match index {
            None => self.rules.push(rule),
            Some(index) if index <= self.rules.len() => {
                self.rules.insert(index, rule)
            }
            Some(index) => {
                return Err(RuleError::BadIndex {
                    index,
                    len: self.rules.len(),
                });
            }
        }

        Ok(())
    }

    /// Parse a rule from `tc flower` tokens and add it. The filter is
    /// left untouched on error.
    pub fn load_rule<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
        index: Option<usize>,
    ) -> Result<(), RuleError> {
        let len = self.rules.len();
        if let Some(index) = index.filter(|i| *i > len) {
            return Err(RuleError::BadIndex { index, len });
        }

        let rule = tc::parse_rule(tokens)?;
        self.add_rule(rule, index)
    }

    /// Like [`Filter::load_rule`], with the tokens given as one
    /// whitespace-separated line.
    pub fn load_rule_line(
        &mut self,
        line: &str,
        index: Option<usize>,
    ) -> Result<(), RuleError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        self.load_rule(&tokens, index)
    }

    pub fn remove_rule(&mut self, index: usize) -> Result<Rule, RuleError> {
        if index >= self.rules.len() {
            return Err(RuleError::BadIndex { index, len: self.rules.len() });
        }

        Ok(self.rules.remove(index))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    #[cfg(feature = "std")]
    pub fn to_json(&self) -> Result<String, RuleError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RuleError::Json(e.to_string()))
    }

    /// Restore a filter saved with [`Filter::to_json`]. Every rule is
    /// held to the same checks as a parsed one, including the match
    /// list invariants.
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let filter: Self = serde_json::from_str(json)
            .map_err(|e| RuleError::Json(e.to_string()))?;
        for rule in &filter.rules {
            rule.validate()?;
            tc::check_match_list(rule.matches())?;
        }
        Ok(filter)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::rule::Action;
    use crate::engine::tc::ParseError;

    fn rule(line: &str) -> Rule {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        tc::parse_rule(&tokens).unwrap()
    }

    #[test]
    fn insertion_order() {
        let mut f = Filter::new();
        let a = rule("protocol ip dst_mac aa:bb:cc:dd:ee:ff action pass");
        let b = rule("protocol ip vlan_id 10 action drop");
        let c = rule("protocol ipv6 ip_ttl 1 action drop");

        f.add_rule(a.clone(), None).unwrap();
        f.add_rule(b.clone(), None).unwrap();
        f.add_rule(c.clone(), Some(0)).unwrap();
        assert_eq!(f.rules(), &[c.clone(), a.clone(), b.clone()]);

        f.add_rule(a.clone(), Some(3)).unwrap();
        assert_eq!(f.len(), 4);
        assert_eq!(f.rules()[3], a);

        assert_eq!(
            f.add_rule(b, Some(5)),
            Err(RuleError::BadIndex { index: 5, len: 4 })
        );
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn load_failure_leaves_filter_alone() {
        let mut f = Filter::new();
        let line = "protocol ip ip_proto udp src_port 53 action pass";
        f.load_rule_line(line, None).unwrap();

        let err = f.load_rule_line("protocol ip dst_port 80 action drop", None);
        assert_eq!(
            err,
            Err(RuleError::Parse(ParseError::MissingRequiredMatch))
        );

        let err = f.load_rule(&["protocol", "ip", "vlan_id", "1"], None);
        assert!(matches!(err, Err(RuleError::Parse(_))));

        let line = "protocol ip vlan_id 1 action pass";
        let err = f.load_rule_line(line, Some(2));
        assert_eq!(err, Err(RuleError::BadIndex { index: 2, len: 1 }));

        assert_eq!(f.len(), 1);
        assert_eq!(f.rules()[0].action(), Action::Pass);
    }

    #[test]
    fn remove_and_clear() {
        let mut f = Filter::new();
        f.load_rule_line("protocol ip vlan_id 1 action pass", None).unwrap();
        f.load_rule_line("protocol ip vlan_id 2 action drop", None).unwrap();

        let r = f.remove_rule(0).unwrap();
        assert_eq!(r.action(), Action::Pass);
        assert_eq!(f.len(), 1);
        assert_eq!(
            f.remove_rule(1),
            Err(RuleError::BadIndex { index: 1, len: 1 })
        );

        f.clear();
        assert!(f.is_empty());
    }

    #[cfg(feature = "std")]
    #[test]
    fn json_save_restore() {
        let mut f = Filter::new();
        f.load_rule_line(
            "protocol ipv6 flower src_ip 2001:db8::1/64 action pass",
            None,
        )
        .unwrap();
        let line = "protocol ip ip_proto tcp dst_port 443 \
            ip_tos 0x10/0xfc action drop";
        f.load_rule_line(line, None).unwrap();

        let json = f.to_json().unwrap();
        assert_eq!(Filter::from_json(&json), Ok(f));
        assert!(matches!(
            Filter::from_json("{ \"rules\": 3 }"),
            Err(RuleError::Json(_))
        ));
    }

    #[cfg(feature = "std")]
    #[test]
    fn json_restore_revalidates() {
        let mut f = Filter::new();
        f.load_rule_line("protocol ip vlan_prio 7 action pass", None).unwrap();
        let json = f.to_json().unwrap();

        // A hand-edited priority which no longer fits in 3 bits.
        let json = json.replace("\"Uint3\": 7", "\"Uint3\": 200");
        assert!(json.contains("200"));
        assert!(matches!(
            Filter::from_json(&json),
            Err(RuleError::BadValue(_))
        ));
    }

    #[cfg(feature = "std")]
    #[test]
    fn json_restore_checks_match_list() {
        let mut f = Filter::new();
        let line = "protocol ip ip_proto 6 dst_port 80 action drop";
        f.load_rule_line(line, None).unwrap();
        let json = f.to_json().unwrap();

        // Swap the protocol match for one that leaves the port orphaned.
        let json = json
            .replace("\"Ip4L4Proto\"", "\"VlanPrio\"")
            .replace("\"Uint8\": 6", "\"Uint3\": 6");
        assert!(json.contains("VlanPrio"));
        assert_eq!(
            Filter::from_json(&json),
            Err(RuleError::Parse(ParseError::MissingRequiredMatch))
        );
    }
}
