// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Parse whole `tc flower` rules through the public API.

use pfc::api::Ipv6Addr;
use pfc::api::Ipv6PrefixLen;
use pfc::api::MacAddr;
use pfc::api::PROTO_TCP;
use pfc::engine::CompOperator;
use pfc::engine::Filter;
use pfc::engine::MatchFlags;
use pfc::engine::MatchType;
use pfc::engine::ParseError;
use pfc::engine::Rule;
use pfc::engine::Value;
use pfc::engine::rule::Action;
use pfc::engine::rule::MAX_MATCHES_PER_RULE;
use pfc::engine::tc::ArgStage;
use pfc::engine::tc::RESERVED_KEYWORDS;
use pfc::engine::tc::parse_rule;

fn parse(line: &str) -> Result<Rule, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    parse_rule(&tokens)
}

fn kinds(rule: &Rule) -> Vec<MatchType> {
    rule.matches().iter().map(|m| m.kind).collect()
}

#[test]
fn tcp_port_rule() {
    let toks = [
        "protocol", "ip", "ip_proto", "tcp", "dst_port", "80", "action", "drop",
    ];
    let rule = parse_rule(&toks).unwrap();

    assert_eq!(rule.action(), Action::Drop);
    assert_eq!(rule.matches().len(), 2);

    let proto = &rule.matches()[0];
    assert_eq!(proto.kind, MatchType::Ip4L4Proto);
    assert_eq!(proto.value, Value::Uint8(PROTO_TCP));

    let port = &rule.matches()[1];
    assert_eq!(port.kind, MatchType::Ip4L4PortDst);
    assert_eq!(port.value, Value::Uint16(80));
}

#[test]
fn ipv6_prefix_rule() {
    let toks =
        ["protocol", "ipv6", "src_ip", "2001:db8::1/64", "action", "pass"];
    let rule = parse_rule(&toks).unwrap();

    assert_eq!(rule.action(), Action::Pass);
    assert_eq!(rule.matches().len(), 1);

    let m = &rule.matches()[0];
    assert_eq!(m.kind, MatchType::Ip6Src);
    let addr = "2001:db8::1".parse::<Ipv6Addr>().unwrap();
    assert_eq!(m.value, Value::Ipv6(addr));
    assert!(m.flags.contains(MatchFlags::USE_MASK));
    let mask = Ipv6PrefixLen::new(64).unwrap().to_netmask();
    assert_eq!(m.mask, mask.bytes());
}

#[test]
fn flower_is_optional() {
    let with = parse("protocol ip flower dst_mac aa:bb:cc:dd:ee:ff action pass")
        .unwrap();
    let without =
        parse("protocol ip dst_mac aa:bb:cc:dd:ee:ff action pass").unwrap();
    assert_eq!(with, without);

    assert_eq!(kinds(&with), [MatchType::EtherDst]);
    let mac = "aa:bb:cc:dd:ee:ff".parse::<MacAddr>().unwrap();
    assert_eq!(with.matches()[0].value, Value::Mac(mac));
    assert_eq!(with.action(), Action::Pass);
}

#[test]
fn unsupported_family() {
    let toks = ["protocol", "arp", "action", "drop"];
    assert_eq!(
        parse_rule(&toks),
        Err(ParseError::UnsupportedProtocol("arp".to_string()))
    );
    assert_eq!(
        parse("protocol IP vlan_id 1 action drop"),
        Err(ParseError::UnsupportedProtocol("IP".to_string()))
    );
    assert_eq!(
        parse("proto ip vlan_id 1 action drop"),
        Err(ParseError::MissingProtocolKeyword("proto".to_string()))
    );
}

#[test]
fn short_rules() {
    let short = [
        "",
        "foo",
        "action drop",
        "proto ip action drop",
        "protocol",
        "protocol ip",
        "protocol ip action",
        "protocol ip action drop",
        "protocol ipv6 flower action drop",
        "protocol ip vlan_id 1 action",
    ];

    for line in short {
        assert!(
            matches!(
                parse(line),
                Err(ParseError::BadArgumentCount {
                    stage: ArgStage::Rule,
                    ..
                })
            ),
            "'{line}' should be too short",
        );
    }
}

#[test]
fn port_requires_proto() {
    let bad = [
        "protocol ip dst_port 80 action drop",
        "protocol ip src_port 80 action drop",
        "protocol ipv6 dst_port 80 action pass",
        "protocol ip vlan_id 3 dst_port 80 action drop",
        "protocol ip dst_port 80 vlan_id 3 action drop",
        "protocol ip src_ip 10.0.0.1 src_port 1 dst_port 2 action drop",
    ];

    for line in bad {
        assert_eq!(
            parse(line),
            Err(ParseError::MissingRequiredMatch),
            "'{line}'"
        );
    }
}

#[test]
fn port_with_proto() {
    let good = [
        "protocol ip ip_proto udp dst_port 53 action pass",
        "protocol ip dst_port 53 ip_proto udp action pass",
        "protocol ipv4 src_port 1024 vlan_id 7 ip_proto 6 action drop",
        "protocol ipv6 ip_proto sctp src_port 9 dst_port 10 action drop",
        "protocol ipv6 dst_port 443 ip_proto tcp action pass",
    ];

    for line in good {
        let rule = parse(line).unwrap_or_else(|e| panic!("'{line}': {e}"));
        assert!(rule.matches().iter().any(|m| m.kind.is_l4_proto()));
        assert!(rule.matches().iter().any(|m| m.kind.is_l4_port()));
    }
}

#[test]
fn matches_keep_parse_order() {
    let rule = parse(
        "protocol ipv6 flower ip_ttl 9 src_mac 0:1:2:3:4:5 \
         dst_ip ::1 vlan_prio 2 cvlan_ethtype 0x8100 action drop",
    )
    .unwrap();

    assert_eq!(
        kinds(&rule),
        [
            MatchType::Ip6Ttl,
            MatchType::EtherSrc,
            MatchType::Ip6Dst,
            MatchType::VlanPrio,
            MatchType::CvlanEthertype,
        ]
    );
    assert_eq!(rule.matches()[4].value, Value::Uint16(0x8100));
    assert!(
        rule.matches().iter().all(|m| m.operator == CompOperator::Equal)
    );
    assert_eq!(rule.action(), Action::Drop);
}

#[test]
fn every_keyword() {
    let v4 = parse(
        "protocol ip vlan_id 4095 vlan_prio 7 vlan_ethtype 0x800 \
         cvlan_id 0 cvlan_prio 1 action pass",
    )
    .unwrap();
    assert_eq!(
        kinds(&v4),
        [
            MatchType::VlanId,
            MatchType::VlanPrio,
            MatchType::VlanEthertype,
            MatchType::CvlanId,
            MatchType::CvlanPrio,
        ]
    );
    assert_eq!(v4.matches()[0].value, Value::Uint12(4095));
    assert_eq!(v4.matches()[1].value, Value::Uint3(7));

    let v4 = parse(
        "protocol ip ip_tos 0x10 ip_ttl 64/0xf0 dst_ip 10.1.0.0/16 \
         src_ip 192.168.0.1 src_mac ff:ff:ff:ff:ff:ff/24 action drop",
    )
    .unwrap();
    assert_eq!(
        kinds(&v4),
        [
            MatchType::Ip4Tos,
            MatchType::Ip4Ttl,
            MatchType::Ip4Dst,
            MatchType::Ip4Src,
            MatchType::EtherSrc,
        ]
    );
    let flags: Vec<bool> = v4
        .matches()
        .iter()
        .map(|m| m.flags.contains(MatchFlags::USE_MASK))
        .collect();
    assert_eq!(flags, [false, true, true, false, true]);

    let v6 = parse(
        "protocol ipv6 ip_tos 0xb8 dst_ip fe80::/10 ip_proto icmpv6 \
         cvlan_id 12 action pass",
    )
    .unwrap();
    assert_eq!(
        kinds(&v6),
        [
            MatchType::Ip6Tos,
            MatchType::Ip6Dst,
            MatchType::Ip6L4Proto,
            MatchType::CvlanId,
        ]
    );
}

// The IPv4 ToS field is only 6 bits wide, but the keyword is read as
// a full byte for both families.
#[test]
fn ip4_tos_is_eight_bits() {
    let rule = parse("protocol ip ip_tos 255 action pass").unwrap();
    assert_eq!(rule.matches()[0].kind, MatchType::Ip4Tos);
    assert_eq!(rule.matches()[0].value, Value::Uint8(255));

    assert!(matches!(
        parse("protocol ip ip_tos 256 action pass"),
        Err(ParseError::MalformedValue { .. })
    ));
}

#[test]
fn value_widths() {
    let bad = [
        ("vlan_id", "4096"),
        ("vlan_prio", "8"),
        ("cvlan_id", "0x1000"),
        ("cvlan_prio", "-1"),
        ("vlan_ethtype", "65536"),
        ("ip_ttl", "256"),
        ("ip_ttl", "1/256"),
        ("dst_port", "65536"),
        ("src_port", "http"),
        ("dst_ip", "10.0.0.1/33"),
        ("src_ip", "10.0.0"),
        ("dst_mac", "aa:bb:cc:dd:ee"),
        ("src_mac", "aa:bb:cc:dd:ee:ff/49"),
    ];

    for (kw, val) in bad {
        let line = format!("protocol ip {kw} {val} action drop");
        match parse(&line) {
            Err(ParseError::MalformedValue { keyword, token, .. }) => {
                assert_eq!(keyword, kw);
                assert_eq!(token, val);
            }
            res => panic!("'{line}' gave {res:?}"),
        }
    }
}

#[test]
fn family_is_fixed() {
    assert!(matches!(
        parse("protocol ipv6 dst_ip 10.0.0.1 action drop"),
        Err(ParseError::MalformedValue { .. })
    ));
    assert!(matches!(
        parse("protocol ip dst_ip 2001:db8::1 action drop"),
        Err(ParseError::MalformedValue { .. })
    ));
}

#[test]
fn bad_ip_proto() {
    assert_eq!(
        parse("protocol ip ip_proto TCP action drop"),
        Err(ParseError::UnsupportedProtocolNumber("TCP".to_string()))
    );
    assert_eq!(
        parse("protocol ip ip_proto 300 action drop"),
        Err(ParseError::UnsupportedProtocolNumber("300".to_string()))
    );
}

#[test]
fn reserved_keywords_are_unsupported() {
    for kw in RESERVED_KEYWORDS {
        let line = format!("protocol ip {kw} 1 action drop");
        assert_eq!(
            parse(&line),
            Err(ParseError::UnsupportedMatchKeyword(kw.to_string())),
            "'{kw}'"
        );
    }

    assert_eq!(
        parse("protocol ip dst_addr 10.0.0.1 action drop"),
        Err(ParseError::UnsupportedMatchKeyword("dst_addr".to_string()))
    );
}

#[test]
fn action_clause() {
    assert_eq!(
        parse("protocol ip vlan_id 1 verdict drop"),
        Err(ParseError::MissingActionKeyword("verdict".to_string()))
    );
    // With three tokens left the loop still expects a match clause.
    assert_eq!(
        parse("protocol ip vlan_id 1 verdict drop now"),
        Err(ParseError::UnsupportedMatchKeyword("verdict".to_string()))
    );
    assert_eq!(
        parse("protocol ip vlan_id 1 action accept"),
        Err(ParseError::UnsupportedActionCode("accept".to_string()))
    );
    assert_eq!(
        parse("protocol ip vlan_id 1 action DROP"),
        Err(ParseError::UnsupportedActionCode("DROP".to_string()))
    );
}

#[test]
fn five_matches() {
    let rule = parse(
        "protocol ip vlan_id 1 vlan_id 2 vlan_id 3 vlan_id 4 vlan_id 5 \
         action pass",
    )
    .unwrap();
    assert_eq!(rule.matches().len(), MAX_MATCHES_PER_RULE);
}

// A sixth match clause is not reported as "too many matches": the
// match loop stops at the cap and the action clause then finds four
// tokens instead of two.
#[test]
fn sixth_match_is_bad_argument_count() {
    assert_eq!(
        parse(
            "protocol ip vlan_id 1 vlan_id 2 vlan_id 3 vlan_id 4 vlan_id 5 \
             vlan_id 6 action pass",
        ),
        Err(ParseError::BadArgumentCount {
            stage: ArgStage::Action,
            remaining: 4,
        })
    );

    // A single stray token after five matches hits the same path.
    assert_eq!(
        parse(
            "protocol ip vlan_id 1 vlan_id 2 vlan_id 3 vlan_id 4 vlan_id 5 \
             extra action pass",
        ),
        Err(ParseError::BadArgumentCount {
            stage: ArgStage::Action,
            remaining: 3,
        })
    );
}

#[test]
fn failed_parse_adds_nothing() {
    let mut filter = Filter::new();
    let lines = [
        "protocol ip ip_proto tcp dst_port 22 action drop",
        "protocol ip dst_port 22 action drop",
        "protocol ipv6 src_ip ::/0 action pass",
        "protocol ipv6 src_ip ::/129 action pass",
    ];

    let results: Vec<bool> = lines
        .iter()
        .map(|l| filter.load_rule_line(l, None).is_ok())
        .collect();

    assert_eq!(results, [true, false, true, false]);
    assert_eq!(filter.len(), 2);
    assert_eq!(filter.rules()[0].action(), Action::Drop);
    assert_eq!(filter.rules()[1].action(), Action::Pass);
}
