// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Support code for the `pfcadm` command: configuration, logging, and
//! reading and writing rule files.

use anyhow::Context;
use anyhow::bail;
use pfc::engine::Filter;
use serde::Deserialize;
use slog::Drain;
use slog::Logger;
use slog::debug;
use slog::error;
use slog::info;
use slog::o;
use std::fs;
use std::io::BufRead;
use std::path::Path;

/// The environment variable holding additional log filters.
pub const LOG_ENV: &str = "RUST_LOG";

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Critical,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Raise the level by `n` steps, stopping at `Trace`.
    pub fn raise(self, n: u8) -> Self {
        let levels = [
            Self::Off,
            Self::Critical,
            Self::Error,
            Self::Warn,
            Self::Info,
            Self::Debug,
            Self::Trace,
        ];
        let pos = levels.iter().position(|l| *l == self).unwrap_or(4);
        levels[(pos + usize::from(n)).min(levels.len() - 1)]
    }
}

impl From<LogLevel> for slog::FilterLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Critical => Self::Critical,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warning,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// The contents of a `pfcadm` configuration file.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AdmConfig {
    pub log_level: LogLevel,
    pub output: OutputConfig,
}

impl AdmConfig {
    /// Read the configuration at `path`. A missing file, or no path at
    /// all, gives the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("bad configuration in {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Build the root logger: terminal output on stderr, filtered by
/// `level` and then by any directives in `RUST_LOG`, and written from
/// a background thread.
pub fn init_logger(level: LogLevel) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    let mut builder = slog_envlogger::LogBuilder::new(drain)
        .filter(None, slog::FilterLevel::from(level));
    if let Ok(directives) = std::env::var(LOG_ENV) {
        builder = builder.parse(&directives);
    }

    let drain = slog_async::Async::new(builder.build().fuse()).build().fuse();
    Logger::root(drain, o!())
}

/// Read rules, one per line, into a new filter.
///
/// Blank lines and lines starting with `#` are skipped. A rejected
/// rule stops the load unless `keep_going` is set, in which case it
/// is logged and skipped.
pub fn load_rules(
    reader: impl BufRead,
    log: &Logger,
    keep_going: bool,
) -> anyhow::Result<Filter> {
    let mut filter = Filter::new();
    let mut rejected = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line =
            line.with_context(|| format!("failed to read line {lineno}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match filter.load_rule_line(line, None) {
            Ok(()) => {
                if let Some(rule) = filter.rules().last() {
                    debug!(log, "loaded rule";
                        "line" => lineno,
                        "matches" => rule.matches().len(),
                        "action" => %rule.action()
                    );
                }
            }

            Err(e) => {
                error!(log, "rejected rule";
                    "line" => lineno,
                    "error" => %e
                );
                if !keep_going {
                    bail!("line {lineno}: {e}");
                }
                rejected += 1;
            }
        }
    }

    info!(log, "filter loaded";
        "rules" => filter.len(),
        "rejected" => rejected
    );
    Ok(filter)
}

/// Save a filter as JSON.
pub fn save_filter(path: &Path, filter: &Filter) -> anyhow::Result<()> {
    let json = filter.to_json()?;
    fs::write(path, json)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Read back a filter saved with [`save_filter`].
pub fn read_filter(path: &Path) -> anyhow::Result<Filter> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Filter::from_json(&json)
        .with_context(|| format!("bad filter in {}", path.display()))
}
