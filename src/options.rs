//! 命令行选项解析。
//! `--until {time}`、`--max-steps {n}`、`--seed {n}`、`--config {file}` 等，
//! 也可通过 `SIMNET_FLAGS` 环境变量传入。

use std::path::PathBuf;

use anyhow::Context;
use clap::{Arg, Command, value_parser};

use crate::config::{SimulationConfig, TieBreakPolicy};

fn make_options_parser() -> Command {
    Command::new("simnet")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Discrete-event Petri-net simulation of a bank counter")
        .arg(
            Arg::new("until")
                .short('u')
                .long("until")
                .value_name("TIME")
                .help("Stop before the first firing later than TIME")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("max-steps")
                .short('n')
                .long("max-steps")
                .value_name("N")
                .help("Stop after N firings")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .help("Seed for arrival/service times and random tie-breaking")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML, JSON or RON run configuration")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("event-log")
                .short('o')
                .long("event-log")
                .value_name("FILE")
                .help("Path to the separator-delimited event log")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("checkpoint-out")
                .long("checkpoint-out")
                .value_name("FILE")
                .help("Write the final state as a JSON or RON checkpoint")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("tellers")
                .short('t')
                .long("tellers")
                .default_value("2")
                .value_parser(value_parser!(u32)),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub until: Option<f64>,
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
    pub config: Option<PathBuf>,
    pub event_log: Option<PathBuf>,
    pub checkpoint_out: Option<PathBuf>,
    pub tellers: u32,
}

impl Options {
    pub fn parse_from_str(s: &str) -> anyhow::Result<Self> {
        let flags = shellwords::split(s).context("splitting option string")?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> anyhow::Result<Self> {
        let matches = make_options_parser().try_get_matches_from(flags.iter())?;
        Ok(Options {
            until: matches.get_one::<f64>("until").copied(),
            max_steps: matches.get_one::<usize>("max-steps").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            event_log: matches.get_one::<PathBuf>("event-log").cloned(),
            checkpoint_out: matches.get_one::<PathBuf>("checkpoint-out").cloned(),
            tellers: matches.get_one::<u32>("tellers").copied().unwrap_or(2),
        })
    }

    /// The configuration file (if any), overridden by explicit flags.
    pub fn simulation_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig::default(),
        };
        if self.until.is_some() {
            config.until = self.until;
        }
        if self.max_steps.is_some() {
            config.max_steps = self.max_steps;
        }
        if let Some(seed) = self.seed {
            config.tie_break = TieBreakPolicy::SeededRandom { seed };
        }
        if self.event_log.is_some() {
            config.event_log = self.event_log.clone();
        }
        Ok(config)
    }
}
