// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Rule parsing microbenchmarks.

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use pfc::engine::Filter;
use pfc::engine::tc::parse_rule;
use std::hint::black_box;

const RULES: [(&str, &str); 4] = [
    ("one_match", "protocol ip vlan_id 100 action pass"),
    (
        "l4_v4",
        "protocol ip flower ip_proto tcp dst_port 443 src_ip 10.0.0.0/8 \
         action drop",
    ),
    (
        "l4_v6",
        "protocol ipv6 ip_proto udp src_port 53 dst_ip 2001:db8::/32 \
         action pass",
    ),
    (
        "five_matches",
        "protocol ip dst_mac aa:bb:cc:dd:ee:ff/24 vlan_id 7 ip_tos 0x10/0xfc \
         ip_ttl 64 dst_ip 192.168.1.1 action drop",
    ),
];

/// Benchmark [`parse_rule`] over already tokenized rules.
fn tc_parse_rule(c: &mut Criterion) {
    let mut group = c.benchmark_group("tc/parse_rule");
    group.throughput(Throughput::Elements(1));

    for (name, line) in RULES {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &tokens,
            |b, tokens| {
                b.iter(|| black_box(parse_rule(black_box(tokens.as_slice()))))
            },
        );
    }

    group.finish();
}

/// Benchmark filling a [`Filter`] from rule lines.
fn filter_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter/load_rule_line");

    for size in [1, 10, 100] {
        group.throughput(Throughput::Elements(size as u64));
        let id = BenchmarkId::from_parameter(size);
        group.bench_with_input(id, &size, |b, &n| {
            b.iter(|| {
                let mut filter = Filter::new();
                for (_, line) in RULES.iter().cycle().take(n) {
                    let _ = black_box(filter.load_rule_line(line, None));
                }
                filter
            })
        });
    }

    group.finish();
}

criterion_group!(benches, tc_parse_rule, filter_load);
criterion_main!(benches);
