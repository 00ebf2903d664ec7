//! 内置报告器：日志、内存记录、分隔符事件日志。
use std::fmt::Debug;
use std::io::Write;

use anyhow::Context;
use itertools::Itertools;

use crate::report::{Firing, Reporter};

/// Logs one `info!` line per firing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl<V: Debug> Reporter<V> for LogReporter {
    fn callback(&mut self, firing: &Firing<V>) -> anyhow::Result<()> {
        log::info!(
            "{}{{{}}} -> {{{}}} @ {}",
            firing.event_name,
            firing
                .consumed
                .iter()
                .map(|(_, token)| format!("{:?}", token.value))
                .join(", "),
            firing
                .produced
                .iter()
                .map(|(_, token)| format!("{:?}@{}", token.value, token.time))
                .join(", "),
            firing.time
        );
        Ok(())
    }
}

/// Keeps every firing in memory.
#[derive(Debug, Clone)]
pub struct FiringLog<V> {
    pub firings: Vec<Firing<V>>,
}

impl<V> Default for FiringLog<V> {
    fn default() -> Self {
        Self {
            firings: Vec::new(),
        }
    }
}

impl<V> FiringLog<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.firings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firings.is_empty()
    }

    /// Event names in firing order.
    pub fn event_names(&self) -> Vec<&str> {
        self.firings.iter().map(|f| f.event_name.as_str()).collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.firings.iter().map(|f| f.time).collect()
    }
}

impl<V: Clone> Reporter<V> for FiringLog<V> {
    fn callback(&mut self, firing: &Firing<V>) -> anyhow::Result<()> {
        self.firings.push(firing.clone());
        Ok(())
    }
}

/// Separator-delimited event log: one header line, then one row per firing
/// with the event, its time, and the consumed and produced values.
pub struct EventLogWriter<W: Write> {
    out: W,
    separator: char,
    header_written: bool,
}

impl<W: Write> EventLogWriter<W> {
    pub fn new(out: W, separator: char) -> Self {
        Self {
            out,
            separator,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) -> anyhow::Result<()> {
        let sep = self.separator.to_string();
        writeln!(
            self.out,
            "{}",
            ["event", "time", "consumed", "produced"].join(&sep)
        )
        .context("writing event log header")?;
        self.header_written = true;
        Ok(())
    }
}

impl<V: Debug, W: Write> Reporter<V> for EventLogWriter<W> {
    fn callback(&mut self, firing: &Firing<V>) -> anyhow::Result<()> {
        if !self.header_written {
            self.write_header()?;
        }
        let sep = self.separator;
        let consumed = firing
            .consumed
            .iter()
            .map(|(_, token)| format!("{:?}", token.value))
            .join(" ");
        let produced = firing
            .produced
            .iter()
            .map(|(_, token)| format!("{:?}", token.value))
            .join(" ");
        writeln!(
            self.out,
            "{}{sep}{}{sep}{}{sep}{}",
            firing.event_name, firing.time, consumed, produced
        )
        .with_context(|| format!("writing event log row for `{}`", firing.event_name))?;
        Ok(())
    }
}
