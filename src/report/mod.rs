//! 发生通知：引擎在每次发生后调用 [`Reporter::callback`]，以及运行摘要。
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::{EventId, PlaceId, Time, Token};

pub mod sinks;

pub use sinks::{EventLogWriter, FiringLog, LogReporter};

/// Everything one firing changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firing<V> {
    pub event: EventId,
    pub event_name: String,
    /// Clock value after the firing.
    pub time: Time,
    pub consumed: Vec<(PlaceId, Token<V>)>,
    pub produced: Vec<(PlaceId, Token<V>)>,
}

/// Receives one call per firing, after the state has been updated.
///
/// An error stops the run and is handed back to the caller of `step`.
pub trait Reporter<V> {
    fn callback(&mut self, firing: &Firing<V>) -> anyhow::Result<()>;
}

/// Ignores every firing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl<V> Reporter<V> for NullReporter {
    fn callback(&mut self, _firing: &Firing<V>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<V, F> Reporter<V> for F
where
    F: FnMut(&Firing<V>) -> anyhow::Result<()>,
{
    fn callback(&mut self, firing: &Firing<V>) -> anyhow::Result<()> {
        self(firing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No event had a binding.
    Exhausted,
    /// The next binding lay beyond the time horizon.
    Horizon,
    /// The step budget ran out.
    StepLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub clock: Time,
    pub stop: StopReason,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "仿真运行摘要")?;
        writeln!(f, "发生次数: {}", self.steps)?;
        writeln!(f, "结束时钟: {}", self.clock)?;
        let reason = match self.stop {
            StopReason::Exhausted => "no enabled event",
            StopReason::Horizon => "time horizon reached",
            StopReason::StepLimit => "step limit reached",
        };
        write!(f, "停止原因: {}", reason)
    }
}
