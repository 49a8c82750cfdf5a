// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use alloc::str::FromStr;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// A MAC address.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Hash,
)]
pub struct MacAddr {
    inner: [u8; 6],
}

impl MacAddr {
    pub const BROADCAST: Self = Self { inner: [0xFF; 6] };
    pub const ZERO: Self = Self { inner: [0x00; 6] };

    /// The number of bits in a MAC address.
    pub const BITS: u8 = 48;

    /// Return the bytes of the MAC address.
    #[inline]
    pub fn bytes(&self) -> [u8; 6] {
        self.inner
    }

    /// Build the mask selecting the `prefix_len` most significant
    /// bits of an address.
    pub fn from_prefix_len(prefix_len: u8) -> Result<Self, String> {
        if prefix_len > Self::BITS {
            return Err(format!("bad MAC prefix length: {prefix_len}"));
        }

        if prefix_len == 0 {
            return Ok(Self::ZERO);
        }

        let bits = (u64::MAX << (64 - prefix_len)) >> 16;
        let be = bits.to_be_bytes();
        Ok(Self { inner: [be[2], be[3], be[4], be[5], be[6], be[7]] })
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self { inner: bytes }
    }
}

impl FromStr for MacAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<u8> = s
            .split(':')
            .map(|s| {
                if s.is_empty()
                    || s.len() > 2
                    || !s.bytes().all(|b| b.is_ascii_hexdigit())
                {
                    return Err(format!("bad octet: '{s}'"));
                }
                u8::from_str_radix(s, 16).map_err(|_| format!("bad octet: {s}"))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        if octets.len() != 6 {
            return Err(format!("incorrect number of bytes: {}", octets.len()));
        }

        let bytes =
            [octets[0], octets[1], octets[2], octets[3], octets[4], octets[5]];

        Ok(MacAddr { inner: bytes })
    }
}

impl Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.inner[0],
            self.inner[1],
            self.inner[2],
            self.inner[3],
            self.inner[4],
            self.inner[5]
        )
    }
}

// There's no reason to view the MAC address as its raw array, so just
// present it in a human-friendly manner.
impl Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MacAddr {{ inner: {self} }}")
    }
}
