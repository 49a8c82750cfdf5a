// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Match criteria used by a `Rule`.

use super::rule::RuleError;
use super::value::RAW_LEN;
use super::value::Value;
use super::value::ValueFormat;
use bitflags::bitflags;
use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The packet field, and address family, a [`Match`] targets.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub enum MatchType {
    /// An empty match slot. Never produced by a parse.
    #[default]
    Unspec,

    EtherSrc,
    EtherDst,
    /// Either source or destination.
    EtherAny,
    EtherProto,

    Ip4Src,
    Ip4Dst,
    Ip4Any,
    Ip4Tos,
    Ip4Ttl,
    Ip4Flags,
    Ip4L4Proto,
    Ip4L4Data,
    Ip4L4PortSrc,
    Ip4L4PortDst,
    Ip4L4PortAny,
    Ip4Spi,
    Ip4TcpFlags,

    Ip6Src,
    Ip6Dst,
    Ip6Any,
    /// The traffic class.
    Ip6Tos,
    /// The hop limit.
    Ip6Ttl,
    Ip6Flags,
    Ip6L4Proto,
    Ip6L4Data,
    Ip6L4PortSrc,
    Ip6L4PortDst,
    Ip6L4PortAny,
    Ip6Spi,
    Ip6TcpFlags,

    IpAnySrc,
    IpAnyDst,
    IpAnyAny,
    IpAnyTos,
    IpAnyTtl,
    IpAnyFlags,
    IpAnyL4Proto,
    IpAnyL4Data,
    IpAnyL4PortSrc,
    IpAnyL4PortDst,
    IpAnyL4PortAny,
    IpAnySpi,
    IpAnyTcpFlags,

    VlanId,
    VlanPrio,
    VlanEthertype,

    CvlanId,
    CvlanPrio,
    CvlanEthertype,

    MplsLabel,
    MplsTc,
    MplsBos,
    MplsTtl,

    IcmpType,
    IcmpCode,

    ArpTip,
    ArpSip,
    ArpOp,
    ArpTha,
    ArpSha,

    EncKeyId,
    EncDstIp,
    EncSrcIp,
    EncDstPort,
    EncTos,
    EncTtl,

    GeneveOptions,
}

impl MatchType {
    /// The value format a match of this kind carries.
    ///
    /// `None` for kinds with no single format: `Unspec`, the
    /// family-agnostic and tunnel addresses (which take either an
    /// IPv4 or an IPv6 address), and Geneve options.
    ///
    /// NOTE: `Ip4Tos` reports 8 bits even though the IPv4 field is only
    /// 6 bits wide. The generator consumes the 8-bit encoding, so it
    /// stays until both sides move together.
    pub fn value_format(&self) -> Option<ValueFormat> {
        use MatchType::*;

        let fmt = match self {
            Unspec | GeneveOptions => return None,
            IpAnySrc | IpAnyDst | IpAnyAny | EncDstIp | EncSrcIp => {
                return None;
            }

            EtherSrc | EtherDst | EtherAny | ArpTha | ArpSha => {
                ValueFormat::Mac
            }
            EtherProto | VlanEthertype | CvlanEthertype | ArpOp => {
                ValueFormat::Uint16
            }

            Ip4Src | Ip4Dst | Ip4Any | ArpTip | ArpSip => ValueFormat::Ipv4,
            Ip6Src | Ip6Dst | Ip6Any => ValueFormat::Ipv6,

            Ip4Tos | Ip6Tos | IpAnyTos => ValueFormat::Uint8,
            Ip4Ttl | Ip6Ttl | IpAnyTtl => ValueFormat::Uint8,
            Ip4Flags | Ip6Flags | IpAnyFlags => ValueFormat::Uint3,
            Ip4L4Proto | Ip6L4Proto | IpAnyL4Proto => ValueFormat::Uint8,
            Ip4L4Data | Ip6L4Data | IpAnyL4Data => ValueFormat::Uint32,
            Ip4Spi | Ip6Spi | IpAnySpi => ValueFormat::Uint32,
            Ip4TcpFlags | Ip6TcpFlags | IpAnyTcpFlags => ValueFormat::Uint12,
            Ip4L4PortSrc | Ip4L4PortDst | Ip4L4PortAny => ValueFormat::Uint16,
            Ip6L4PortSrc | Ip6L4PortDst | Ip6L4PortAny => ValueFormat::Uint16,
            IpAnyL4PortSrc | IpAnyL4PortDst | IpAnyL4PortAny => {
                ValueFormat::Uint16
            }

            VlanId | CvlanId => ValueFormat::Uint12,
            VlanPrio | CvlanPrio => ValueFormat::Uint3,

            MplsLabel => ValueFormat::Uint20,
            MplsTc => ValueFormat::Uint3,
            MplsBos => ValueFormat::Bit,
            MplsTtl => ValueFormat::Uint8,

            IcmpType | IcmpCode => ValueFormat::Uint8,

            EncKeyId => ValueFormat::Uint32,
            EncDstPort => ValueFormat::Uint16,
            EncTos | EncTtl => ValueFormat::Uint8,
        };

        Some(fmt)
    }

    /// Can a match of this kind carry a value of format `fmt`?
    pub fn accepts(&self, fmt: ValueFormat) -> bool {
        use MatchType::*;

        match self {
            IpAnySrc | IpAnyDst | IpAnyAny | EncDstIp | EncSrcIp => {
                matches!(fmt, ValueFormat::Ipv4 | ValueFormat::Ipv6)
            }
            _ => self.value_format() == Some(fmt),
        }
    }

    /// Is this a match on the L4 protocol of any family?
    pub fn is_l4_proto(&self) -> bool {
        matches!(self, Self::Ip4L4Proto | Self::Ip6L4Proto | Self::IpAnyL4Proto)
    }

    /// Is this a match on an L4 port of any family and direction?
    pub fn is_l4_port(&self) -> bool {
        use MatchType::*;

        matches!(
            self,
            Ip4L4PortSrc
                | Ip4L4PortDst
                | Ip4L4PortAny
                | Ip6L4PortSrc
                | Ip6L4PortDst
                | Ip6L4PortAny
                | IpAnyL4PortSrc
                | IpAnyL4PortDst
                | IpAnyL4PortAny
        )
    }
}

impl Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use MatchType::*;

        let s = match self {
            Unspec => "unspec",
            EtherSrc => "ether_src",
            EtherDst => "ether_dst",
            EtherAny => "ether_any",
            EtherProto => "ether_proto",
            Ip4Src => "ip4_src",
            Ip4Dst => "ip4_dst",
            Ip4Any => "ip4_any",
            Ip4Tos => "ip4_tos",
            Ip4Ttl => "ip4_ttl",
            Ip4Flags => "ip4_flags",
            Ip4L4Proto => "ip4_l4proto",
            Ip4L4Data => "ip4_l4data",
            Ip4L4PortSrc => "ip4_l4port_src",
            Ip4L4PortDst => "ip4_l4port_dst",
            Ip4L4PortAny => "ip4_l4port_any",
            Ip4Spi => "ip4_spi",
            Ip4TcpFlags => "ip4_tcp_flags",
            Ip6Src => "ip6_src",
            Ip6Dst => "ip6_dst",
            Ip6Any => "ip6_any",
            Ip6Tos => "ip6_tos",
            Ip6Ttl => "ip6_ttl",
            Ip6Flags => "ip6_flags",
            Ip6L4Proto => "ip6_l4proto",
            Ip6L4Data => "ip6_l4data",
            Ip6L4PortSrc => "ip6_l4port_src",
            Ip6L4PortDst => "ip6_l4port_dst",
            Ip6L4PortAny => "ip6_l4port_any",
            Ip6Spi => "ip6_spi",
            Ip6TcpFlags => "ip6_tcp_flags",
            IpAnySrc => "ip_any_src",
            IpAnyDst => "ip_any_dst",
            IpAnyAny => "ip_any_any",
            IpAnyTos => "ip_any_tos",
            IpAnyTtl => "ip_any_ttl",
            IpAnyFlags => "ip_any_flags",
            IpAnyL4Proto => "ip_any_l4proto",
            IpAnyL4Data => "ip_any_l4data",
            IpAnyL4PortSrc => "ip_any_l4port_src",
            IpAnyL4PortDst => "ip_any_l4port_dst",
            IpAnyL4PortAny => "ip_any_l4port_any",
            IpAnySpi => "ip_any_spi",
            IpAnyTcpFlags => "ip_any_tcp_flags",
            VlanId => "vlan_id",
            VlanPrio => "vlan_prio",
            VlanEthertype => "vlan_ethertype",
            CvlanId => "cvlan_id",
            CvlanPrio => "cvlan_prio",
            CvlanEthertype => "cvlan_ethertype",
            MplsLabel => "mpls_label",
            MplsTc => "mpls_tc",
            MplsBos => "mpls_bos",
            MplsTtl => "mpls_ttl",
            IcmpType => "icmp_type",
            IcmpCode => "icmp_code",
            ArpTip => "arp_tip",
            ArpSip => "arp_sip",
            ArpOp => "arp_op",
            ArpTha => "arp_tha",
            ArpSha => "arp_sha",
            EncKeyId => "enc_key_id",
            EncDstIp => "enc_dst_ip",
            EncSrcIp => "enc_src_ip",
            EncDstPort => "enc_dst_port",
            EncTos => "enc_tos",
            EncTtl => "enc_ttl",
            GeneveOptions => "geneve_options",
        };
        write!(f, "{s}")
    }
}

/// How the packet field is compared against the match value.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub enum CompOperator {
    #[default]
    Equal,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Display for CompOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Equal => "==",
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterOrEqual => ">=",
        };
        write!(f, "{s}")
    }
}

bitflags! {
/// Which of the optional parts of a [`Match`] are in use.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize,
)]
pub struct MatchFlags: u8 {
    /// `mask` holds an explicit mask.
    const USE_MASK  = 1 << 0;
    /// `max_value` holds the inclusive upper bound of a range.
    const USE_RANGE = 1 << 1;
}
}

/// A single filtering criterion.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub kind: MatchType,
    pub operator: CompOperator,
    pub value: Value,
    /// Raw upper bound, meaningful only with `USE_RANGE`.
    pub max_value: [u8; RAW_LEN],
    /// Raw mask; all ones unless `USE_MASK` is set.
    pub mask: [u8; RAW_LEN],
    pub flags: MatchFlags,
}

impl Match {
    /// An exact match of `kind` against `value`.
    pub fn new(kind: MatchType, value: Value) -> Self {
        Self {
            kind,
            operator: CompOperator::Equal,
            value,
            max_value: [0; RAW_LEN],
            mask: [0xFF; RAW_LEN],
            flags: MatchFlags::empty(),
        }
    }

    /// Build and validate a match.
    ///
    /// A `max_value` turns the match into an inclusive range over
    /// `value..=max_value`; a `mask` is taken in raw, left-aligned
    /// form.
    pub fn create(
        kind: MatchType,
        operator: CompOperator,
        value: Value,
        max_value: Option<Value>,
        mask: Option<[u8; RAW_LEN]>,
    ) -> Result<Self, RuleError> {
        let mut m = Self::new(kind, value);
        m.operator = operator;

        if let Some(max) = max_value {
            if max.format() != value.format() {
                return Err(RuleError::FormatMismatch {
                    kind,
                    found: max.format(),
                });
            }
            m.max_value = max.to_raw();
            m.flags |= MatchFlags::USE_RANGE;
        }

        if let Some(mask) = mask {
            m = m.with_mask(mask);
        }

        m.validate()?;
        Ok(m)
    }

    /// Set an explicit mask.
    pub fn with_mask(mut self, mask: [u8; RAW_LEN]) -> Self {
        self.mask = mask;
        self.flags |= MatchFlags::USE_MASK;
        self
    }

    /// Check the invariants of a single match: a real kind, a value of
    /// the format the kind expects, and a well-ordered range.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.kind == MatchType::Unspec {
            return Err(RuleError::UnspecMatch);
        }

        if !self.kind.accepts(self.value.format()) {
            return Err(RuleError::FormatMismatch {
                kind: self.kind,
                found: self.value.format(),
            });
        }

        self.value.validate().map_err(RuleError::BadValue)?;

        // Both buffers are big-endian and left-aligned for the same
        // format, so comparing them bytewise compares the values.
        if self.flags.contains(MatchFlags::USE_RANGE)
            && self.max_value < self.value.to_raw()
        {
            return Err(RuleError::BadRange);
        }

        Ok(())
    }
}

impl Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.operator, self.value)
    }
}
