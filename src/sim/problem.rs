//! 仿真问题（引擎）：拥有库所/事件图、仿真时钟与优先级表，
//! 执行 绑定搜索 → 选择 → 发生 → 通知 的循环。
//!
//! 选择规则：时间最小者优先；同时间取优先级数值最小者；仍然并列时交由
//! [`TieBreak`] 裁决。发生是原子的：所有前置条件与产出函数在修改任何库所
//! 之前完成求值。
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::report::{Firing, Reporter, RunSummary, StopReason};
use crate::sim::binding::{
    Binding, DEFAULT_PRIORITY, Priority, TokenCombinations, min_time_bindings, tokens_combinations,
};
use crate::sim::checkpoint::{Checkpoint, PersistedCheckpoint, PersistedPlace};
use crate::sim::error::SimError;
use crate::sim::event::{Event, Produce};
use crate::sim::ids::{EventId, PlaceId, TokenId};
use crate::sim::index_vec::{Idx, IndexVec};
use crate::sim::place::{Place, PlaceKind};
use crate::sim::select::{FirstEncountered, TieBreak};
use crate::sim::token::{Time, TimeKey, Token, TokenRef, check_time};

/// Step and time budget for [`Problem::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunLimits {
    /// Bindings later than this are not fired.
    pub until: Option<Time>,
    pub max_steps: Option<usize>,
}

impl RunLimits {
    pub fn until(until: Time) -> Self {
        Self {
            until: Some(until),
            max_steps: None,
        }
    }

    pub fn steps(max_steps: usize) -> Self {
        Self {
            until: None,
            max_steps: Some(max_steps),
        }
    }
}

/// 连通性诊断报告
#[derive(Debug, Clone, Default)]
pub struct DiagnosticReport {
    /// 没有任何事件读写的库所
    pub isolated_places: Vec<(PlaceId, String)>,
    pub warnings: Vec<String>,
    pub total_places: usize,
    pub total_events: usize,
}

impl DiagnosticReport {
    pub fn has_issues(&self) -> bool {
        !self.isolated_places.is_empty() || !self.warnings.is_empty()
    }
}

pub struct Problem<V> {
    places: IndexVec<PlaceId, Place<V>>,
    events: IndexVec<EventId, Event<V>>,
    place_names: IndexMap<String, PlaceId>,
    event_names: IndexMap<String, EventId>,
    priorities: IndexVec<EventId, Priority>,
    clock: Time,
    tie_break: Box<dyn TieBreak>,
}

impl<V> fmt::Debug for Problem<V>
where
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("clock", &self.clock)
            .field("places", &self.places)
            .field("events", &self.events)
            .field("priorities", &self.priorities)
            .finish()
    }
}

impl<V> Default for Problem<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Problem<V> {
    pub fn new() -> Self {
        Self::with_tie_break(Box::new(FirstEncountered))
    }

    pub fn with_tie_break(tie_break: Box<dyn TieBreak>) -> Self {
        Self {
            places: IndexVec::new(),
            events: IndexVec::new(),
            place_names: IndexMap::new(),
            event_names: IndexMap::new(),
            priorities: IndexVec::new(),
            clock: 0.0,
            tie_break,
        }
    }

    pub fn set_tie_break(&mut self, tie_break: Box<dyn TieBreak>) {
        self.tie_break = tie_break;
    }

    pub fn clock(&self) -> Time {
        self.clock
    }

    pub fn add_place(&mut self, name: impl Into<String>, kind: PlaceKind) -> Result<PlaceId, SimError> {
        let name = name.into();
        if self.place_names.contains_key(&name) {
            return Err(SimError::DuplicatePlace(name));
        }
        let id = self.places.push(Place::new(name.clone(), kind));
        self.place_names.insert(name, id);
        Ok(id)
    }

    /// A basic (unordered) place.
    pub fn add_var(&mut self, name: impl Into<String>) -> Result<PlaceId, SimError> {
        self.add_place(name, PlaceKind::Basic)
    }

    /// Declares an event consuming one token from each `inflow` place and
    /// feeding the `outflow` places through `behavior`.
    pub fn add_event<F>(
        &mut self,
        name: impl Into<String>,
        inflow: &[PlaceId],
        outflow: &[PlaceId],
        behavior: F,
    ) -> Result<EventId, SimError>
    where
        F: Fn(&[&V]) -> anyhow::Result<Vec<Option<Produce<V>>>> + 'static,
    {
        let name = name.into();
        if self.event_names.contains_key(&name) {
            return Err(SimError::DuplicateEvent(name));
        }
        if inflow.is_empty() {
            return Err(SimError::EmptyInflow(name));
        }
        self.check_places(inflow.iter().chain(outflow))?;

        let event = Event::new(name.clone(), inflow.to_vec(), outflow.to_vec(), behavior);
        let id = self.events.push(event);
        self.priorities.push(DEFAULT_PRIORITY);
        self.event_names.insert(name, id);
        Ok(id)
    }

    pub fn set_guard<G>(&mut self, event: EventId, guard: G) -> Result<(), SimError>
    where
        G: Fn(&[&V]) -> anyhow::Result<bool> + 'static,
    {
        self.event_mut(event)?.set_guard(guard);
        Ok(())
    }

    pub fn clear_guard(&mut self, event: EventId) -> Result<(), SimError> {
        self.event_mut(event)?.clear_guard();
        Ok(())
    }

    /// Replaces the input places of `event`.
    pub fn set_inflow(&mut self, event: EventId, inflow: &[PlaceId]) -> Result<(), SimError> {
        self.check_places(inflow)?;
        let target = self.event_mut(event)?;
        if inflow.is_empty() {
            return Err(SimError::EmptyInflow(target.name().to_string()));
        }
        target.set_inflow(inflow.to_vec());
        Ok(())
    }

    /// Replaces the output places of `event` together with its outflow.
    pub fn set_outflow<F>(&mut self, event: EventId, outflow: &[PlaceId], behavior: F) -> Result<(), SimError>
    where
        F: Fn(&[&V]) -> anyhow::Result<Vec<Option<Produce<V>>>> + 'static,
    {
        self.check_places(outflow)?;
        self.event_mut(event)?.set_outflow(outflow.to_vec(), behavior);
        Ok(())
    }

    /// Takes effect from the next binding search on.
    pub fn set_binding_priority(&mut self, event: EventId, priority: Priority) -> Result<(), SimError> {
        let slot = self
            .priorities
            .get_mut(event)
            .ok_or(SimError::UnknownEvent(event))?;
        *slot = priority;
        Ok(())
    }

    pub fn priority(&self, event: EventId) -> Option<Priority> {
        self.priorities.get(event).copied()
    }

    pub fn place(&self, place: PlaceId) -> Option<&Place<V>> {
        self.places.get(place)
    }

    pub fn event(&self, event: EventId) -> Option<&Event<V>> {
        self.events.get(event)
    }

    pub fn place_by_name(&self, name: &str) -> Option<PlaceId> {
        self.place_names.get(name).copied()
    }

    pub fn event_by_name(&self, name: &str) -> Option<EventId> {
        self.event_names.get(name).copied()
    }

    pub fn places(&self) -> impl Iterator<Item = (PlaceId, &Place<V>)> {
        self.places.iter_enumerated()
    }

    pub fn events(&self) -> impl Iterator<Item = (EventId, &Event<V>)> {
        self.events.iter_enumerated()
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn events_len(&self) -> usize {
        self.events.len()
    }

    /// Token count per place, in declaration order.
    pub fn marking(&self) -> IndexMap<String, usize> {
        self.places
            .iter()
            .map(|place| (place.name().to_string(), place.len()))
            .collect()
    }

    /// Lazy cross product of the candidate tokens of `places`.
    pub fn tokens_combinations(&self, places: &[PlaceId]) -> Result<TokenCombinations<'_, V>, SimError> {
        let mut inputs = Vec::with_capacity(places.len());
        for &id in places {
            inputs.push((id, self.places.get(id).ok_or(SimError::UnknownPlace(id))?));
        }
        Ok(tokens_combinations(inputs))
    }

    /// Earliest-time bindings of one event.
    pub fn event_bindings(&self, event: EventId) -> Result<Vec<Binding>, SimError> {
        let target = self.events.get(event).ok_or(SimError::UnknownEvent(event))?;
        min_time_bindings(event, target, &self.places, self.clock, self.priorities[event])
    }

    /// Earliest-time bindings of every event, in event declaration order.
    pub fn bindings(&self) -> Result<Vec<Binding>, SimError> {
        let mut all = Vec::new();
        for (id, event) in self.events.iter_enumerated() {
            all.extend(min_time_bindings(
                id,
                event,
                &self.places,
                self.clock,
                self.priorities[id],
            )?);
        }
        Ok(all)
    }

    /// Picks the binding the next step would fire: smallest time, then
    /// smallest priority value, then the tie-break strategy.
    pub fn select(&mut self, bindings: &[Binding]) -> Option<Binding> {
        let tied = bindings
            .iter()
            .min_set_by_key(|binding| (TimeKey(binding.time), binding.priority));
        if tied.is_empty() {
            return None;
        }
        let pick = self.tie_break.choose(&tied).min(tied.len() - 1);
        Some(tied[pick].clone())
    }

    /// Computes all bindings and selects one, without firing it.
    pub fn next_binding(&mut self) -> Result<Option<Binding>, SimError> {
        let bindings = self.bindings()?;
        Ok(self.select(&bindings))
    }

    pub fn store_checkpoint(&self) -> Checkpoint<V> {
        Checkpoint {
            clock: self.clock,
            places: self.places.iter().map(Place::store_checkpoint).collect(),
        }
    }

    /// Replaces every place's tokens and the clock. Nothing changes if the
    /// checkpoint does not fit this problem.
    pub fn restore_checkpoint(&mut self, checkpoint: &Checkpoint<V>) -> Result<(), SimError> {
        if checkpoint.places.len() != self.places.len() {
            return Err(SimError::CheckpointMismatch(format!(
                "{} places in checkpoint, {} in problem",
                checkpoint.places.len(),
                self.places.len()
            )));
        }
        for (id, saved) in checkpoint.places.iter_enumerated() {
            let place = &self.places[id];
            if saved.kind() != place.kind() {
                return Err(SimError::CheckpointMismatch(format!(
                    "place `{}` is {:?}, checkpoint holds {:?}",
                    place.name(),
                    place.kind(),
                    saved.kind()
                )));
            }
        }
        for (id, saved) in checkpoint.places.iter_enumerated() {
            self.places[id].restore_checkpoint(saved)?;
        }
        self.clock = checkpoint.clock;
        log::debug!("restored checkpoint at clock {}", self.clock);
        Ok(())
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph Problem {{");
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for (place_id, place) in self.places.iter_enumerated() {
            let label = format!(
                "{}\\n{:?}\\n{}",
                escape_label(place.name()),
                place.kind(),
                place.len()
            );
            let _ = writeln!(
                &mut dot,
                "    place_{} [label=\"{}\", shape=circle, style=filled, fillcolor=\"#e3f2fd\"];",
                place_id.index(),
                label
            );
        }

        for (event_id, event) in self.events.iter_enumerated() {
            let label = format!(
                "{}\\npriority {}",
                escape_label(event.name()),
                self.priorities[event_id]
            );
            let _ = writeln!(
                &mut dot,
                "    event_{} [label=\"{}\", shape=box, style=filled, fillcolor=\"#ffe0b2\"];",
                event_id.index(),
                label
            );
            for place in event.inflow() {
                let _ = writeln!(&mut dot, "    place_{} -> event_{};", place.index(), event_id.index());
            }
            for place in event.outflow() {
                let _ = writeln!(&mut dot, "    event_{} -> place_{};", event_id.index(), place.index());
            }
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }

    /// 检测没有事件连接的库所、永远无法提供令牌的输入库所，以及没有输出库所的事件。
    pub fn diagnose_connectivity(&self) -> DiagnosticReport {
        let mut isolated_places = Vec::new();
        let mut warnings = Vec::new();

        for (place_id, place) in self.places.iter_enumerated() {
            let read = self.events.iter().any(|e| e.inflow().contains(&place_id));
            let written = self.events.iter().any(|e| e.outflow().contains(&place_id));

            if !read && !written {
                isolated_places.push((place_id, place.name().to_string()));
            } else if read && !written && place.is_empty() {
                warnings.push(format!(
                    "place `{}` (id={}) is only consumed from, never fed, and holds no tokens",
                    place.name(),
                    place_id.index()
                ));
            }
        }

        for (event_id, event) in self.events.iter_enumerated() {
            if event.outflow().is_empty() {
                warnings.push(format!(
                    "event `{}` (id={}) has no output places; its tokens leave the net",
                    event.name(),
                    event_id.index()
                ));
            }
        }

        DiagnosticReport {
            isolated_places,
            warnings,
            total_places: self.places.len(),
            total_events: self.events.len(),
        }
    }

    pub fn log_diagnostics(&self) {
        let report = self.diagnose_connectivity();
        if !report.has_issues() {
            log::info!("连通性检查通过，无孤立库所");
            return;
        }
        log::warn!(
            "=== 连通性诊断: {} 个库所, {} 个事件 ===",
            report.total_places,
            report.total_events
        );
        for (id, name) in &report.isolated_places {
            log::warn!("  孤立库所 [{}] {}", id.index(), name);
        }
        for warning in &report.warnings {
            log::warn!("  - {}", warning);
        }
    }

    fn check_places<'p>(&self, places: impl IntoIterator<Item = &'p PlaceId>) -> Result<(), SimError> {
        for &place in places {
            if !self.places.contains(place) {
                return Err(SimError::UnknownPlace(place));
            }
        }
        Ok(())
    }

    fn event_mut(&mut self, event: EventId) -> Result<&mut Event<V>, SimError> {
        self.events.get_mut(event).ok_or(SimError::UnknownEvent(event))
    }
}

impl<V: Clone> Problem<V> {
    /// Adds a token available at the current clock.
    pub fn put(&mut self, place: PlaceId, value: V) -> Result<TokenId, SimError> {
        let clock = self.clock;
        self.put_at(place, value, clock)
    }

    pub fn put_at(&mut self, place: PlaceId, value: V, time: Time) -> Result<TokenId, SimError> {
        self.places
            .get_mut(place)
            .ok_or(SimError::UnknownPlace(place))?
            .add(value, time)
    }

    /// Removes a token by identity.
    pub fn remove(&mut self, token: TokenRef) -> Result<Token<V>, SimError> {
        self.places
            .get_mut(token.place)
            .ok_or(SimError::UnknownPlace(token.place))?
            .remove(token.token)
    }

    /// Applies `binding`: consumes its tokens, evaluates the outflow, adds
    /// the produced tokens and moves the clock to the binding time.
    ///
    /// The binding is checked again before anything changes: its time may
    /// not precede the clock or any consumed token, and the guard must
    /// accept the tokens. Either the whole firing is applied or, on error,
    /// nothing is.
    pub fn fire(&mut self, binding: &Binding) -> Result<Firing<V>, SimError> {
        let (event_name, pending) = self.prepare_firing(binding)?;

        // all checks passed; from here on nothing can fail
        let mut firing = Firing {
            event: binding.event,
            event_name,
            time: binding.time,
            consumed: Vec::with_capacity(binding.tokens.len()),
            produced: Vec::with_capacity(pending.len()),
        };
        for token_ref in &binding.tokens {
            let token = self.places[token_ref.place].remove(token_ref.token)?;
            firing.consumed.push((token_ref.place, token));
        }
        for (place, value, time) in pending {
            let target = &mut self.places[place];
            let id = target.add(value, time)?;
            if let Some(token) = target.get(id) {
                firing.produced.push((place, token.clone()));
            }
        }
        self.clock = binding.time;

        log::debug!(
            "fired `{}` at {}: {} consumed, {} produced",
            firing.event_name,
            firing.time,
            firing.consumed.len(),
            firing.produced.len()
        );
        Ok(firing)
    }

    /// One simulation cycle. `Ok(None)` when no event has a binding; the
    /// state is then left untouched.
    pub fn step(&mut self, reporter: &mut dyn Reporter<V>) -> Result<Option<Firing<V>>, SimError> {
        let Some(binding) = self.next_binding()? else {
            return Ok(None);
        };
        self.fire_and_report(&binding, reporter).map(Some)
    }

    /// Steps until the next binding lies beyond `until` or none remain.
    pub fn simulate(&mut self, until: Time, reporter: &mut dyn Reporter<V>) -> Result<RunSummary, SimError> {
        self.run(&RunLimits::until(until), reporter)
    }

    pub fn run(&mut self, limits: &RunLimits, reporter: &mut dyn Reporter<V>) -> Result<RunSummary, SimError> {
        let mut steps = 0usize;
        let stop = loop {
            if limits.max_steps.is_some_and(|max| steps >= max) {
                break StopReason::StepLimit;
            }
            let Some(binding) = self.next_binding()? else {
                break StopReason::Exhausted;
            };
            if limits.until.is_some_and(|until| binding.time > until) {
                break StopReason::Horizon;
            }
            self.fire_and_report(&binding, reporter)?;
            steps += 1;
        };
        let summary = RunSummary {
            steps,
            clock: self.clock,
            stop,
        };
        log::info!(
            "simulation stopped ({:?}) after {} steps at clock {}",
            summary.stop,
            summary.steps,
            summary.clock
        );
        Ok(summary)
    }

    /// Serializable copy of `checkpoint`, places named as in this problem.
    pub fn persist_checkpoint(&self, checkpoint: &Checkpoint<V>) -> Result<PersistedCheckpoint<V>, SimError> {
        if checkpoint.places.len() != self.places.len() {
            return Err(SimError::CheckpointMismatch(format!(
                "{} places in checkpoint, {} in problem",
                checkpoint.places.len(),
                self.places.len()
            )));
        }
        let places = self
            .places
            .iter()
            .zip(checkpoint.places.iter())
            .map(|(place, saved)| PersistedPlace {
                id: place.name().to_string(),
                kind: saved.kind(),
                tokens: saved
                    .ordered_tokens()
                    .into_iter()
                    .map(|token| (token.value.clone(), token.time))
                    .collect(),
            })
            .collect();
        Ok(PersistedCheckpoint {
            clock: checkpoint.clock,
            places,
        })
    }

    /// Loads a persisted checkpoint. Every place of this problem must be
    /// present with the same variant; tokens are re-inserted in stored order.
    pub fn restore_persisted(&mut self, persisted: &PersistedCheckpoint<V>) -> Result<(), SimError> {
        let clock = check_time(persisted.clock).ok_or(SimError::InvalidTime(persisted.clock))?;
        if persisted.places.len() != self.places.len() {
            return Err(SimError::CheckpointMismatch(format!(
                "{} places in checkpoint, {} in problem",
                persisted.places.len(),
                self.places.len()
            )));
        }
        let by_name: IndexMap<&str, &PersistedPlace<V>> = persisted
            .places
            .iter()
            .map(|place| (place.id.as_str(), place))
            .collect();

        let mut rebuilt = IndexVec::<PlaceId, Place<V>>::new();
        for place in self.places.iter() {
            let saved = by_name.get(place.name()).ok_or_else(|| {
                SimError::CheckpointMismatch(format!("place `{}` missing", place.name()))
            })?;
            if saved.kind != place.kind() {
                return Err(SimError::CheckpointMismatch(format!(
                    "place `{}` is {:?}, checkpoint holds {:?}",
                    place.name(),
                    place.kind(),
                    saved.kind
                )));
            }
            let mut fresh = place.emptied();
            for (value, time) in &saved.tokens {
                fresh.add(value.clone(), *time)?;
            }
            rebuilt.push(fresh);
        }
        self.places = rebuilt;
        self.clock = clock;
        Ok(())
    }

    /// Validates `binding` and evaluates the outflow without touching any
    /// place. Returns the event name and the tokens to add.
    fn prepare_firing(&self, binding: &Binding) -> Result<(String, Vec<(PlaceId, V, Time)>), SimError> {
        let event = self
            .events
            .get(binding.event)
            .ok_or(SimError::UnknownEvent(binding.event))?;
        if check_time(binding.time).is_none() {
            return Err(SimError::InvalidTime(binding.time));
        }
        if binding.time < self.clock {
            return Err(SimError::Causality {
                event: event.name().to_string(),
                time: binding.time,
                clock: self.clock,
            });
        }
        if binding.tokens.len() != event.inflow().len() {
            return Err(SimError::Arity {
                event: event.name().to_string(),
                expected: event.inflow().len(),
                actual: binding.tokens.len(),
            });
        }

        let mut values: SmallVec<[&V; 4]> = SmallVec::new();
        for (idx, (token_ref, &expected)) in binding.tokens.iter().zip(event.inflow()).enumerate() {
            if token_ref.place != expected {
                return Err(SimError::UnknownPlace(token_ref.place));
            }
            if binding.tokens[..idx].contains(token_ref) {
                return Err(SimError::DuplicateToken {
                    event: event.name().to_string(),
                    token: token_ref.token,
                });
            }
            let place = &self.places[expected];
            let token = place.get(token_ref.token).ok_or_else(|| SimError::TokenNotFound {
                place: place.name().to_string(),
                token: token_ref.token,
            })?;
            if token.time > binding.time {
                return Err(SimError::Premature {
                    event: event.name().to_string(),
                    time: binding.time,
                    available: token.time,
                });
            }
            values.push(&token.value);
        }

        if !event.accepts(&values)? {
            return Err(SimError::GuardRejected {
                event: event.name().to_string(),
            });
        }
        let outputs = event.produce(&values)?;
        let mut pending = Vec::new();
        for (&place, entry) in event.outflow().iter().zip(outputs) {
            if let Some(Produce { value, delay }) = entry {
                let time = binding.time + delay;
                if check_time(time).is_none() {
                    return Err(SimError::InvalidTime(time));
                }
                pending.push((place, value, time));
            }
        }
        Ok((event.name().to_string(), pending))
    }

    fn fire_and_report(&mut self, binding: &Binding, reporter: &mut dyn Reporter<V>) -> Result<Firing<V>, SimError> {
        let firing = self.fire(binding)?;
        reporter
            .callback(&firing)
            .map_err(|source| SimError::Reporter {
                time: firing.time,
                source,
            })?;
        Ok(firing)
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
