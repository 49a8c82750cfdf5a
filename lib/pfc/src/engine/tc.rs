// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Parse rules written in `tc flower` syntax.
//!
//! ```text
//! protocol { ip | ipv4 | ipv6 } [ flower ] <match>* action { pass | drop }
//! ```
//!
//! Each `<match>` is a keyword followed by exactly one value token.
//! The value encoding depends on the keyword, and for the IP keywords
//! on the address family chosen by the `protocol` clause. Parsing is
//! strictly left to right and stops at the first error; no partially
//! built rule is ever returned.

use super::cursor::Cursor;
use super::predicate::Match;
use super::predicate::MatchType;
use super::rule::Action;
use super::rule::MAX_MATCHES_PER_RULE;
use super::rule::Rule;
use super::value::Value;
use super::value::ValueFormat;
use crate::api::Protocol;
use crate::api::parse_ipv4_slash_mask;
use crate::api::parse_ipv6_slash_mask;
use crate::api::parse_mac_slash_mask;
use crate::api::parse_uint;
use crate::api::parse_uint_slash_mask;
use alloc::string::String;
use alloc::string::ToString;
use core::fmt;
use core::fmt::Display;

/// The shortest rule accepted: the protocol clause, one match, and
/// the action clause.
pub const MIN_RULE_TOKENS: usize = 6;

// The `action <code>` pair always closes a rule.
const ACTION_TOKENS: usize = 2;

/// `tc flower` keywords which are known but not supported. They are
/// rejected like any other unknown keyword.
pub const RESERVED_KEYWORDS: [&str; 20] = [
    "type",
    "code",
    "tcp_flags",
    "mpls_label",
    "mpls_tc",
    "mpls_bos",
    "mpls_ttl",
    "arp_tip",
    "arp_sip",
    "arp_op",
    "arp_tha",
    "arp_sha",
    "enc_key_id",
    "enc_dst_ip",
    "enc_src_ip",
    "enc_dst_port",
    "enc_tos",
    "enc_ttl",
    "geneve_opts",
    "ip_flags",
];

/// Where in a rule the token count came up short.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArgStage {
    Rule,
    Match,
    Action,
}

impl Display for ArgStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Rule => "rule",
            Self::Match => "match value",
            Self::Action => "action",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("bad number of arguments for parsing {stage} ({remaining} left)")]
    BadArgumentCount { stage: ArgStage, remaining: usize },

    #[error("failed to parse protocol: expected 'protocol', got '{0}'")]
    MissingProtocolKeyword(String),

    #[error("unsupported protocol {0}")]
    UnsupportedProtocol(String),

    #[error("unsupported match keyword {0}")]
    UnsupportedMatchKeyword(String),

    #[error("unsupported protocol number {0}")]
    UnsupportedProtocolNumber(String),

    #[error("malformed value '{token}' for {keyword}: {reason}")]
    MalformedValue { keyword: String, token: String, reason: String },

    #[error("src_port/dst_port requires ip_proto")]
    MissingRequiredMatch,

    #[error("failed to parse action: expected 'action', got '{0}'")]
    MissingActionKeyword(String),

    #[error("unsupported action code {0}")]
    UnsupportedActionCode(String),

    #[error("failed to allocate rule")]
    AllocationFailure,
}

/// The address family a rule's IP matches are written against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddrFamily {
    V4,
    V6,
}

impl AddrFamily {
    fn pick(&self, v4: MatchType, v6: MatchType) -> MatchType {
        match self {
            Self::V4 => v4,
            Self::V6 => v6,
        }
    }
}

/// The match keywords understood by the parser.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Keyword {
    DstMac,
    SrcMac,
    VlanId,
    VlanPrio,
    VlanEthtype,
    CvlanId,
    CvlanPrio,
    CvlanEthtype,
    IpProto,
    IpTos,
    IpTtl,
    DstIp,
    SrcIp,
    DstPort,
    SrcPort,
}

/// How the value token following a keyword is decoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Encoding {
    Mac,
    Uint(ValueFormat),
    UintMask(ValueFormat),
    IpProto,
    /// An IPv4 or IPv6 address, per the rule's family.
    Ip,
}

impl Keyword {
    pub const ALL: [Keyword; 15] = [
        Self::DstMac,
        Self::SrcMac,
        Self::VlanId,
        Self::VlanPrio,
        Self::VlanEthtype,
        Self::CvlanId,
        Self::CvlanPrio,
        Self::CvlanEthtype,
        Self::IpProto,
        Self::IpTos,
        Self::IpTtl,
        Self::DstIp,
        Self::SrcIp,
        Self::DstPort,
        Self::SrcPort,
    ];

    /// Look up a keyword by its exact spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kw| kw.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DstMac => "dst_mac",
            Self::SrcMac => "src_mac",
            Self::VlanId => "vlan_id",
            Self::VlanPrio => "vlan_prio",
            Self::VlanEthtype => "vlan_ethtype",
            Self::CvlanId => "cvlan_id",
            Self::CvlanPrio => "cvlan_prio",
            Self::CvlanEthtype => "cvlan_ethtype",
            Self::IpProto => "ip_proto",
            Self::IpTos => "ip_tos",
            Self::IpTtl => "ip_ttl",
            Self::DstIp => "dst_ip",
            Self::SrcIp => "src_ip",
            Self::DstPort => "dst_port",
            Self::SrcPort => "src_port",
        }
    }

    // NOTE: `ip_tos` is read as 8 bits for both families, even though
    // the IPv4 field is 6 bits wide.
    fn encoding(&self) -> Encoding {
        match self {
            Self::DstMac | Self::SrcMac => Encoding::Mac,
            Self::VlanId | Self::CvlanId => Encoding::Uint(ValueFormat::Uint12),
            Self::VlanPrio | Self::CvlanPrio => {
                Encoding::Uint(ValueFormat::Uint3)
            }
            Self::VlanEthtype | Self::CvlanEthtype => {
                Encoding::Uint(ValueFormat::Uint16)
            }
            Self::IpProto => Encoding::IpProto,
            Self::IpTos | Self::IpTtl => Encoding::UintMask(ValueFormat::Uint8),
            Self::DstIp | Self::SrcIp => Encoding::Ip,
            Self::DstPort | Self::SrcPort => {
                Encoding::Uint(ValueFormat::Uint16)
            }
        }
    }

    /// The match kind this keyword produces under `family`.
    pub fn match_type(&self, family: AddrFamily) -> MatchType {
        use MatchType::*;

        match self {
            Self::DstMac => EtherDst,
            Self::SrcMac => EtherSrc,
            Self::VlanId => VlanId,
            Self::VlanPrio => VlanPrio,
            Self::VlanEthtype => VlanEthertype,
            Self::CvlanId => CvlanId,
            Self::CvlanPrio => CvlanPrio,
            Self::CvlanEthtype => CvlanEthertype,
            Self::IpProto => family.pick(Ip4L4Proto, Ip6L4Proto),
            Self::IpTos => family.pick(Ip4Tos, Ip6Tos),
            Self::IpTtl => family.pick(Ip4Ttl, Ip6Ttl),
            Self::DstIp => family.pick(Ip4Dst, Ip6Dst),
            Self::SrcIp => family.pick(Ip4Src, Ip6Src),
            Self::DstPort => family.pick(Ip4L4PortDst, Ip6L4PortDst),
            Self::SrcPort => family.pick(Ip4L4PortSrc, Ip6L4PortSrc),
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse one rule from its tokens.
pub fn parse_rule<S: AsRef<str>>(tokens: &[S]) -> Result<Rule, ParseError> {
    let mut cursor = Cursor::new(tokens);

    if tokens.len() < MIN_RULE_TOKENS {
        // An unknown family is reported as such, even in a short rule.
        if let Err(e @ ParseError::UnsupportedProtocol(_)) =
            parse_protocol(&mut cursor)
        {
            return Err(e);
        }

        return Err(ParseError::BadArgumentCount {
            stage: ArgStage::Rule,
            remaining: tokens.len(),
        });
    }

    let family = parse_protocol(&mut cursor)?;

    if cursor.current() == Some("flower") {
        cursor.advance();
    }

    // The loop stops at the match cap even when more than the action
    // pair is left. `parse_action` then reports the leftovers as a bad
    // argument count rather than as too many matches.
    let mut matches = heapless::Vec::<Match, MAX_MATCHES_PER_RULE>::new();
    while cursor.remaining() > ACTION_TOKENS && !matches.is_full() {
        let m = parse_match(&mut cursor, family)?;
        matches.push(m).map_err(|_| ParseError::AllocationFailure)?;
    }

    check_match_list(&matches)?;
    let action = parse_action(&mut cursor)?;
    compose_rule(&matches, action)
}

/// Consume `protocol <family>`, returning the family.
pub fn parse_protocol<S: AsRef<str>>(
    cursor: &mut Cursor<'_, S>,
) -> Result<AddrFamily, ParseError> {
    let short = |c: &Cursor<'_, S>| ParseError::BadArgumentCount {
        stage: ArgStage::Rule,
        remaining: c.remaining(),
    };

    let kw = cursor.next_token().ok_or_else(|| short(cursor))?;
    if kw != "protocol" {
        return Err(ParseError::MissingProtocolKeyword(kw.to_string()));
    }

    let family = cursor.next_token().ok_or_else(|| short(cursor))?;
    match family {
        "ip" | "ipv4" => Ok(AddrFamily::V4),
        "ipv6" => Ok(AddrFamily::V6),
        _ => Err(ParseError::UnsupportedProtocol(family.to_string())),
    }
}

/// Consume one `<keyword> <value>` pair.
pub fn parse_match<S: AsRef<str>>(
    cursor: &mut Cursor<'_, S>,
    family: AddrFamily,
) -> Result<Match, ParseError> {
    let short = |c: &Cursor<'_, S>| ParseError::BadArgumentCount {
        stage: ArgStage::Match,
        remaining: c.remaining(),
    };

    if cursor.remaining() < 2 {
        return Err(short(cursor));
    }

    let name = cursor.next_token().ok_or_else(|| short(cursor))?;
    let keyword = Keyword::from_name(name)
        .ok_or_else(|| ParseError::UnsupportedMatchKeyword(name.to_string()))?;
    let token = cursor.next_token().ok_or_else(|| short(cursor))?;

    let malformed = |reason: String| ParseError::MalformedValue {
        keyword: keyword.to_string(),
        token: token.to_string(),
        reason,
    };

    let kind = keyword.match_type(family);

    let m = match keyword.encoding() {
        Encoding::Mac => {
            let (addr, mask) = parse_mac_slash_mask(token).map_err(malformed)?;
            masked(kind, Value::Mac(addr), mask.map(Value::Mac))
        }

        Encoding::Uint(fmt) => {
            let val = parse_uint(token, fmt.bits())
                .and_then(|v| Value::from_uint(fmt, u64::from(v)))
                .map_err(malformed)?;
            Match::new(kind, val)
        }

        Encoding::UintMask(fmt) => {
            let (val, mask) =
                parse_uint_slash_mask(token, fmt.bits()).map_err(malformed)?;
            let val =
                Value::from_uint(fmt, u64::from(val)).map_err(malformed)?;
            let mask = mask
                .map(|m| Value::from_uint(fmt, u64::from(m)))
                .transpose()
                .map_err(malformed)?;
            masked(kind, val, mask)
        }

        Encoding::IpProto => Match::new(kind, parse_ip_proto(token)?),

        Encoding::Ip => match family {
            AddrFamily::V4 => {
                let (addr, mask) =
                    parse_ipv4_slash_mask(token).map_err(malformed)?;
                masked(kind, Value::Ipv4(addr), mask.map(Value::Ipv4))
            }

            AddrFamily::V6 => {
                let (addr, mask) =
                    parse_ipv6_slash_mask(token).map_err(malformed)?;
                masked(kind, Value::Ipv6(addr), mask.map(Value::Ipv6))
            }
        },
    };

    Ok(m)
}

fn masked(kind: MatchType, val: Value, mask: Option<Value>) -> Match {
    let m = Match::new(kind, val);
    match mask {
        Some(mask) => m.with_mask(mask.to_raw()),
        None => m,
    }
}

/// Decode the value of `ip_proto`: a protocol name or an 8-bit number.
fn parse_ip_proto(token: &str) -> Result<Value, ParseError> {
    if let Some(proto) = Protocol::from_alias(token) {
        return Ok(Value::Uint8(u8::from(proto)));
    }

    parse_uint(token, 8)
        .and_then(|v| Value::from_uint(ValueFormat::Uint8, u64::from(v)))
        .map_err(|_| ParseError::UnsupportedProtocolNumber(token.to_string()))
}

/// Check the invariants spanning the whole match list. Scanning stops
/// at the first `Unspec` slot.
pub fn check_match_list(matches: &[Match]) -> Result<(), ParseError> {
    let mut found_proto = false;
    let mut found_port = false;

    for m in matches.iter().take_while(|m| m.kind != MatchType::Unspec) {
        found_proto |= m.kind.is_l4_proto();
        found_port |= m.kind.is_l4_port();
    }

    if found_port && !found_proto {
        return Err(ParseError::MissingRequiredMatch);
    }

    Ok(())
}

/// Consume `action <code>`, which must be all that is left.
pub fn parse_action<S: AsRef<str>>(
    cursor: &mut Cursor<'_, S>,
) -> Result<Action, ParseError> {
    if cursor.remaining() != ACTION_TOKENS {
        return Err(ParseError::BadArgumentCount {
            stage: ArgStage::Action,
            remaining: cursor.remaining(),
        });
    }

    let short = |c: &Cursor<'_, S>| ParseError::BadArgumentCount {
        stage: ArgStage::Action,
        remaining: c.remaining(),
    };

    let kw = cursor.next_token().ok_or_else(|| short(cursor))?;
    if kw != "action" {
        return Err(ParseError::MissingActionKeyword(kw.to_string()));
    }

    let code = cursor.next_token().ok_or_else(|| short(cursor))?;
    code.parse()
        .map_err(|_| ParseError::UnsupportedActionCode(code.to_string()))
}

/// Build the final rule from validated matches.
pub fn compose_rule(
    matches: &[Match],
    action: Action,
) -> Result<Rule, ParseError> {
    let matches = heapless::Vec::from_slice(matches)
        .map_err(|_| ParseError::AllocationFailure)?;
    Ok(Rule::from_parts(matches, action))
}
