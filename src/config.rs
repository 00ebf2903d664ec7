//! 运行配置：时间/步数预算、并列裁决策略、事件日志输出，以及日志初始化。
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sim::io::{self, IoError};
use crate::sim::{FirstEncountered, Problem, RunLimits, SeededRandom, Time, TieBreak};

/// How ties on (time, priority) are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TieBreakPolicy {
    #[default]
    FirstEncountered,
    SeededRandom { seed: u64 },
}

impl TieBreakPolicy {
    pub fn build(&self) -> Box<dyn TieBreak> {
        match *self {
            TieBreakPolicy::FirstEncountered => Box::new(FirstEncountered),
            TieBreakPolicy::SeededRandom { seed } => Box::new(SeededRandom::new(seed)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub until: Option<Time>,
    pub max_steps: Option<usize>,
    pub tie_break: TieBreakPolicy,
    /// Where to write the event log, if anywhere.
    pub event_log: Option<PathBuf>,
    pub separator: char,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            until: None,
            max_steps: None,
            tie_break: TieBreakPolicy::default(),
            event_log: None,
            separator: ';',
        }
    }
}

impl SimulationConfig {
    /// Loads a TOML, JSON or RON file, picked by extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let config: Self = io::read_path(path.as_ref())?;
        log::debug!("loaded configuration from {}: {:?}", path.as_ref().display(), config);
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, IoError> {
        io::from_toml_str(s)
    }

    pub fn limits(&self) -> RunLimits {
        RunLimits {
            until: self.until,
            max_steps: self.max_steps,
        }
    }

    /// Installs the configured tie-break strategy on `problem`.
    pub fn apply<V>(&self, problem: &mut Problem<V>) {
        problem.set_tie_break(self.tie_break.build());
    }
}

/// Initialises `env_logger` from `SIMNET_LOG` / `SIMNET_LOG_STYLE`.
/// Calling it more than once is harmless.
pub fn init_logging() {
    let env = env_logger::Env::new()
        .filter("SIMNET_LOG")
        .write_style("SIMNET_LOG_STYLE");
    let _ = env_logger::Builder::from_env(env).try_init();
}
