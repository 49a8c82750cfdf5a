// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Literal codecs for rule values.
//!
//! Each function turns one token into a width-checked scalar or an
//! address, optionally split into `value/mask` form. An absent mask
//! means an exact match. Addresses are returned as written; applying
//! the mask is left to whoever generates the classifier.

use crate::ip::Ipv4Addr;
use crate::ip::Ipv4PrefixLen;
use crate::ip::Ipv6Addr;
use crate::ip::Ipv6PrefixLen;
use crate::mac::MacAddr;
use alloc::string::String;
use core::result;

type Result<T> = result::Result<T, String>;

/// Check that `value` fits in an unsigned field of `nb_bits` bits.
pub fn check_uint(value: u64, nb_bits: u8) -> Result<u32> {
    if nb_bits == 0 || nb_bits > 32 {
        return Err(format!("unsupported integer width: {nb_bits}"));
    }

    let max = (1u64 << nb_bits) - 1;
    if value > max {
        return Err(format!(
            "value {value} does not fit in {nb_bits} bits (max {max})"
        ));
    }

    // Cannot fail, `max` is at most `u32::MAX`.
    u32::try_from(value).map_err(|e| format!("{e}"))
}

/// Parse an unsigned literal of at most `nb_bits` bits.
///
/// The literal is decimal, or hexadecimal when prefixed with `0x`.
pub fn parse_uint(input: &str, nb_bits: u8) -> Result<u32> {
    let (digits, radix) = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (input, 10),
    };

    // `from_str_radix` accepts a leading '+', we do not.
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("bad unsigned integer: '{input}'"));
    }

    let value = u64::from_str_radix(digits, radix)
        .map_err(|e| format!("bad unsigned integer '{input}': {e}"))?;
    check_uint(value, nb_bits)
}

/// Parse `value` or `value/mask`, both of at most `nb_bits` bits.
pub fn parse_uint_slash_mask(
    input: &str,
    nb_bits: u8,
) -> Result<(u32, Option<u32>)> {
    match input.split_once('/') {
        Some((value, mask)) => {
            let value = parse_uint(value, nb_bits)?;
            let mask = parse_uint(mask, nb_bits)
                .map_err(|e| format!("bad mask: {e}"))?;
            Ok((value, Some(mask)))
        }

        None => Ok((parse_uint(input, nb_bits)?, None)),
    }
}

// A suffix made only of digits is a prefix length, anything else is
// a mask written in the address notation.
fn is_prefix_len(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit())
}

fn parse_prefix_len(suffix: &str) -> Result<u8> {
    suffix.parse::<u8>().map_err(|_| format!("bad prefix length: {suffix}"))
}

/// Parse `addr`, `addr/mask` or `addr/prefixlen` for a MAC address.
pub fn parse_mac_slash_mask(
    input: &str,
) -> Result<(MacAddr, Option<MacAddr>)> {
    let Some((addr, suffix)) = input.split_once('/') else {
        return Ok((input.parse()?, None));
    };

    let addr = addr.parse::<MacAddr>()?;
    let mask = if is_prefix_len(suffix) {
        MacAddr::from_prefix_len(parse_prefix_len(suffix)?)?
    } else {
        suffix.parse::<MacAddr>().map_err(|e| format!("bad mask: {e}"))?
    };

    Ok((addr, Some(mask)))
}

/// Parse `addr`, `addr/mask` or `addr/prefixlen` for an IPv4 address.
pub fn parse_ipv4_slash_mask(
    input: &str,
) -> Result<(Ipv4Addr, Option<Ipv4Addr>)> {
    let Some((addr, suffix)) = input.split_once('/') else {
        return Ok((input.parse()?, None));
    };

    let addr = addr.parse::<Ipv4Addr>()?;
    let mask = if is_prefix_len(suffix) {
        Ipv4PrefixLen::new(parse_prefix_len(suffix)?)?.to_netmask()
    } else {
        suffix.parse::<Ipv4Addr>().map_err(|e| format!("bad mask: {e}"))?
    };

    Ok((addr, Some(mask)))
}

/// Parse `addr`, `addr/mask` or `addr/prefixlen` for an IPv6 address.
pub fn parse_ipv6_slash_mask(
    input: &str,
) -> Result<(Ipv6Addr, Option<Ipv6Addr>)> {
    let Some((addr, suffix)) = input.split_once('/') else {
        return Ok((input.parse()?, None));
    };

    let addr = addr.parse::<Ipv6Addr>()?;
    let mask = if is_prefix_len(suffix) {
        Ipv6PrefixLen::new(parse_prefix_len(suffix)?)?.to_netmask()
    } else {
        suffix.parse::<Ipv6Addr>().map_err(|e| format!("bad mask: {e}"))?
    };

    Ok((addr, Some(mask)))
}
