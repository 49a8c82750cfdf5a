// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use core::result;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

pub const PROTO_ICMP: u8 = 0x1;
pub const PROTO_TCP: u8 = 0x6;
pub const PROTO_UDP: u8 = 0x11;
pub const PROTO_ICMPV6: u8 = 0x3A;
pub const PROTO_SCTP: u8 = 0x84;

/// An IP protocol value.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum Protocol {
    ICMP,
    TCP,
    UDP,
    ICMPv6,
    SCTP,
    Unknown(u8),
}

impl Protocol {
    /// Resolve one of the protocol names accepted in rule text.
    ///
    /// Names are matched exactly; `TCP` is not an alias for `tcp`.
    pub fn from_alias(name: &str) -> Option<Self> {
        match name {
            "tcp" => Some(Self::TCP),
            "udp" => Some(Self::UDP),
            "sctp" => Some(Self::SCTP),
            "icmp" => Some(Self::ICMP),
            "icmpv6" => Some(Self::ICMPv6),
            _ => None,
        }
    }
}

impl From<u8> for Protocol {
    fn from(proto: u8) -> Self {
        match proto {
            PROTO_ICMP => Self::ICMP,
            PROTO_TCP => Self::TCP,
            PROTO_UDP => Self::UDP,
            PROTO_ICMPV6 => Self::ICMPv6,
            PROTO_SCTP => Self::SCTP,
            _ => Self::Unknown(proto),
        }
    }
}

impl From<Protocol> for u8 {
    fn from(proto: Protocol) -> u8 {
        match proto {
            Protocol::ICMP => PROTO_ICMP,
            Protocol::TCP => PROTO_TCP,
            Protocol::UDP => PROTO_UDP,
            Protocol::ICMPv6 => PROTO_ICMPV6,
            Protocol::SCTP => PROTO_SCTP,
            Protocol::Unknown(v) => v,
        }
    }
}

/// An IPv4 address.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[repr(C)]
pub struct Ipv4Addr {
    inner: [u8; 4],
}

impl Ipv4Addr {
    pub const ANY_ADDR: Self = Self { inner: [0; 4] };
    pub const LOCAL_BCAST: Self = Self { inner: [255; 4] };

    /// Return the bytes of the address.
    #[inline]
    pub fn bytes(&self) -> [u8; 4] {
        self.inner
    }
}

impl From<[u8; 4]> for Ipv4Addr {
    fn from(bytes: [u8; 4]) -> Self {
        Self { inner: bytes }
    }
}

impl FromStr for Ipv4Addr {
    type Err = String;

    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let octets: Vec<u8> = val
            .split('.')
            .map(|s| {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(format!("bad octet: '{s}'"));
                }
                s.parse().map_err(|e| format!("{e}"))
            })
            .collect::<result::Result<Vec<u8>, _>>()?;

        if octets.len() != 4 {
            return Err(format!("malformed ip: {val}"));
        }

        Ok(Self { inner: [octets[0], octets[1], octets[2], octets[3]] })
    }
}

impl Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.inner[0], self.inner[1], self.inner[2], self.inner[3],
        )
    }
}

// There's no reason to view an Ipv4Addr as its raw array, so just
// present it in a human-friendly manner.
impl Debug for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ipv4Addr {{ inner: {self} }}")
    }
}

/// An IPv6 address.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct Ipv6Addr {
    inner: [u8; 16],
}

impl Ipv6Addr {
    /// The unspecified IPv6 address, i.e., `::` or all zeros.
    pub const ANY_ADDR: Self = Self { inner: [0; 16] };

    /// Return the bytes of the address.
    pub fn bytes(&self) -> [u8; 16] {
        self.inner
    }

    pub const fn from_const(words: [u16; 8]) -> Self {
        let w0 = words[0].to_be_bytes();
        let w1 = words[1].to_be_bytes();
        let w2 = words[2].to_be_bytes();
        let w3 = words[3].to_be_bytes();
        let w4 = words[4].to_be_bytes();
        let w5 = words[5].to_be_bytes();
        let w6 = words[6].to_be_bytes();
        let w7 = words[7].to_be_bytes();
        Self {
            inner: [
                w0[0], w0[1], w1[0], w1[1], w2[0], w2[1], w3[0], w3[1], w4[0],
                w4[1], w5[0], w5[1], w6[0], w6[1], w7[0], w7[1],
            ],
        }
    }
}

impl fmt::Display for Ipv6Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sip6 = smoltcp::wire::Ipv6Address(self.bytes());
        write!(f, "{sip6}")
    }
}

impl From<[u8; 16]> for Ipv6Addr {
    fn from(bytes: [u8; 16]) -> Ipv6Addr {
        Ipv6Addr { inner: bytes }
    }
}

impl FromStr for Ipv6Addr {
    type Err = String;

    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let ip = val
            .parse::<smoltcp::wire::Ipv6Address>()
            .map_err(|_| format!("invalid IPv6 address: {val}"))?;
        Ok(Self { inner: ip.0 })
    }
}

/// A valid IPv4 prefix length.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, Ord, PartialOrd,
)]
pub struct Ipv4PrefixLen(u8);

impl Ipv4PrefixLen {
    pub fn new(prefix_len: u8) -> Result<Self, String> {
        if prefix_len > 32 {
            return Err(format!("bad IPv4 prefix length: {prefix_len}"));
        }

        Ok(Self(prefix_len))
    }

    /// Convert the prefix length into a subnet mask.
    pub fn to_netmask(self) -> Ipv4Addr {
        if self.0 == 0 {
            return Ipv4Addr::ANY_ADDR;
        }

        Ipv4Addr::from((u32::MAX << (32 - self.0)).to_be_bytes())
    }
}

/// A valid IPv6 prefix length.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, Ord, PartialOrd,
)]
pub struct Ipv6PrefixLen(u8);

impl Ipv6PrefixLen {
    pub fn new(prefix_len: u8) -> result::Result<Self, String> {
        if prefix_len > 128 {
            return Err(format!("bad IPv6 prefix length: {prefix_len}"));
        }

        Ok(Self(prefix_len))
    }

    /// Convert the prefix length into a subnet mask.
    pub fn to_netmask(self) -> Ipv6Addr {
        if self.0 == 0 {
            return Ipv6Addr::ANY_ADDR;
        }

        let mask = u128::MAX << (128 - u32::from(self.0));
        Ipv6Addr::from(mask.to_be_bytes())
    }
}
