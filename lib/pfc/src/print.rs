// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Print filters and rules in a human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both pfcadm and integration tests.

use crate::engine::filter::Filter;
use crate::engine::predicate::Match;
use crate::engine::predicate::MatchFlags;
use crate::engine::rule::Rule;
use crate::engine::value::Value;
use std::io::Write;
use std::string::String;
use std::string::ToString;
use tabwriter::TabWriter;

/// Print a [`Filter`].
pub fn print_filter(filter: &Filter) -> std::io::Result<()> {
    print_filter_into(&mut std::io::stdout(), filter)
}

/// Print a [`Filter`].
pub fn print_filter_into(
    writer: &mut impl Write,
    filter: &Filter,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);

    writeln!(t, "Filter ({} rules)", filter.len())?;
    write_hrb(&mut t)?;
    print_rule_header(&mut t)?;
    write_hr(&mut t)?;
    for (idx, rule) in filter.rules().iter().enumerate() {
        print_rule(&mut t, idx, rule)?;
    }
    t.flush()
}

/// Print a single [`Rule`], as if it sat at `idx` in a filter.
pub fn print_rule_into(
    writer: &mut impl Write,
    idx: usize,
    rule: &Rule,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    print_rule_header(&mut t)?;
    write_hr(&mut t)?;
    print_rule(&mut t, idx, rule)?;
    t.flush()
}

pub fn print_rule_header(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "IDX\tACTION\tMATCH\tOP\tVALUE\tMASK\tMAX")
}

/// Print one row per match. Only the first row carries the index and
/// action.
pub fn print_rule(
    t: &mut impl Write,
    idx: usize,
    rule: &Rule,
) -> std::io::Result<()> {
    for (i, m) in rule.matches().iter().enumerate() {
        let (mask, max) = (mask_str(m), max_str(m));
        if i == 0 {
            writeln!(
                t,
                "{idx}\t{}\t{}\t{}\t{}\t{mask}\t{max}",
                rule.action(),
                m.kind,
                m.operator,
                m.value,
            )?;
        } else {
            writeln!(
                t,
                "\t\t{}\t{}\t{}\t{mask}\t{max}",
                m.kind, m.operator, m.value,
            )?;
        }
    }

    Ok(())
}

fn mask_str(m: &Match) -> String {
    if !m.flags.contains(MatchFlags::USE_MASK) {
        return "-".to_string();
    }

    let fmt = m.value.format();
    if fmt.is_uint() {
        let mask = m.mask[..fmt.byte_len()]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        return format!("0x{mask:x}");
    }

    Value::from_raw(fmt, &m.mask)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "?".to_string())
}

fn max_str(m: &Match) -> String {
    if !m.flags.contains(MatchFlags::USE_RANGE) {
        return "-".to_string();
    }

    Value::from_raw(m.value.format(), &m.max_value)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "?".to_string())
}

/// Output a horizontal rule in bold to the given writer.
pub fn write_hrb(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:=<70}", "=")
}

/// Output a horizontal rule to the given writer.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}
