// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use slog::Logger;
use slog::debug;
use slog::info;

use pfc::api::API_VERSION;
use pfc::engine::Filter;
use pfc::engine::Rule;
use pfc::engine::tc::parse_rule;
use pfc::print::print_filter;
use pfc::print::print_rule_into;
use pfcadm::AdmConfig;
use pfcadm::OutputFormat;
use pfcadm::init_logger;
use pfcadm::load_rules;
use pfcadm::read_filter;
use pfcadm::save_filter;

fn pfc_pkg_version() -> String {
    format!("{} (API version {API_VERSION})", env!("CARGO_PKG_VERSION"))
}

/// Parse and inspect tc-flower packet filter rules
#[derive(Debug, Parser)]
#[command(version = pfc_pkg_version())]
struct Cli {
    /// Read settings from this TOML file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log more; may be repeated.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a single rule given as tokens, e.g.
    /// `pfcadm parse -- protocol ip ip_proto tcp dst_port 22 action drop`.
    Parse {
        /// Print the rule as JSON.
        #[arg(long)]
        json: bool,

        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        tokens: Vec<String>,
    },

    /// Load rules, one per line, into a filter.
    Load {
        /// Read rules from this file instead of stdin.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Save the resulting filter as JSON.
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Print the filter as JSON.
        #[arg(long)]
        json: bool,

        /// Skip rejected rules instead of stopping at the first one.
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Print a filter saved by `load --save`.
    Show {
        file: PathBuf,

        /// Print the filter as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn print_json<T: serde::Serialize>(val: &T) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, val)?;
    writeln!(out)?;
    Ok(())
}

fn output_rule(rule: &Rule, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(rule);
    }

    print_rule_into(&mut io::stdout().lock(), 0, rule)?;
    Ok(())
}

fn output_filter(filter: &Filter, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(filter);
    }

    print_filter(filter)?;
    Ok(())
}

fn run(cmd: Command, cfg: &AdmConfig, log: &Logger) -> anyhow::Result<()> {
    let cfg_json = cfg.output.format == OutputFormat::Json;

    match cmd {
        Command::Parse { json, tokens } => {
            let rule = parse_rule(tokens.as_slice())
                .context("failed to parse rule")?;
            debug!(log, "parsed rule"; "matches" => rule.matches().len());
            output_rule(&rule, json || cfg_json)?;
        }

        Command::Load { file, save, json, keep_going } => {
            let filter = match &file {
                Some(path) => {
                    let f = File::open(path).with_context(|| {
                        format!("failed to open {}", path.display())
                    })?;
                    load_rules(BufReader::new(f), log, keep_going)?
                }

                None => load_rules(io::stdin().lock(), log, keep_going)?,
            };

            if let Some(out) = &save {
                save_filter(out, &filter)?;
                info!(log, "filter saved"; "path" => %out.display());
            }

            output_filter(&filter, json || cfg_json)?;
        }

        Command::Show { file, json } => {
            let filter = read_filter(&file)?;
            output_filter(&filter, json || cfg_json)?;
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AdmConfig::load(cli.config.as_deref())?;
    let log = init_logger(cfg.log_level.raise(cli.verbose));

    // The logger is dropped after `run` returns, flushing the async
    // drain before any error is reported.
    let res = run(cli.cmd, &cfg, &log);
    drop(log);
    res
}
