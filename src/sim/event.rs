//! 事件（迁移）：输入库所、守卫、产出函数。
use std::fmt;

use crate::sim::error::SimError;
use crate::sim::ids::PlaceId;
use crate::sim::token::{Time, check_time};

/// Guard over one value per input place, in inflow order.
pub type Guard<V> = Box<dyn Fn(&[&V]) -> anyhow::Result<bool>>;

/// Outflow over one value per input place; one entry per output place.
pub type Outflow<V> = Box<dyn Fn(&[&V]) -> anyhow::Result<Vec<Option<Produce<V>>>>>;

/// A value to put on an output place, `delay` after the firing time.
#[derive(Debug, Clone, PartialEq)]
pub struct Produce<V> {
    pub value: V,
    pub delay: Time,
}

impl<V> Produce<V> {
    pub fn now(value: V) -> Self {
        Self { value, delay: 0.0 }
    }

    pub fn after(value: V, delay: Time) -> Self {
        Self { value, delay }
    }
}

pub struct Event<V> {
    name: String,
    inflow: Vec<PlaceId>,
    outflow: Vec<PlaceId>,
    guard: Option<Guard<V>>,
    behavior: Outflow<V>,
}

impl<V> Event<V> {
    pub(crate) fn new<F>(name: String, inflow: Vec<PlaceId>, outflow: Vec<PlaceId>, behavior: F) -> Self
    where
        F: Fn(&[&V]) -> anyhow::Result<Vec<Option<Produce<V>>>> + 'static,
    {
        Self {
            name,
            inflow,
            outflow,
            guard: None,
            behavior: Box::new(behavior),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inflow(&self) -> &[PlaceId] {
        &self.inflow
    }

    pub fn outflow(&self) -> &[PlaceId] {
        &self.outflow
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    pub(crate) fn set_guard<G>(&mut self, guard: G)
    where
        G: Fn(&[&V]) -> anyhow::Result<bool> + 'static,
    {
        self.guard = Some(Box::new(guard));
    }

    pub(crate) fn clear_guard(&mut self) {
        self.guard = None;
    }

    pub(crate) fn set_inflow(&mut self, inflow: Vec<PlaceId>) {
        self.inflow = inflow;
    }

    pub(crate) fn set_outflow<F>(&mut self, outflow: Vec<PlaceId>, behavior: F)
    where
        F: Fn(&[&V]) -> anyhow::Result<Vec<Option<Produce<V>>>> + 'static,
    {
        self.outflow = outflow;
        self.behavior = Box::new(behavior);
    }

    /// Evaluates the guard; no guard means always enabled.
    pub(crate) fn accepts(&self, values: &[&V]) -> Result<bool, SimError> {
        match &self.guard {
            None => Ok(true),
            Some(guard) => guard(values).map_err(|source| SimError::Guard {
                event: self.name.clone(),
                source,
            }),
        }
    }

    /// Runs the outflow function and checks its shape.
    pub(crate) fn produce(&self, values: &[&V]) -> Result<Vec<Option<Produce<V>>>, SimError> {
        let produced = (self.behavior)(values).map_err(|source| SimError::Outflow {
            event: self.name.clone(),
            source,
        })?;
        if produced.len() != self.outflow.len() {
            return Err(SimError::Arity {
                event: self.name.clone(),
                expected: self.outflow.len(),
                actual: produced.len(),
            });
        }
        for entry in produced.iter().flatten() {
            if check_time(entry.delay).is_none() {
                return Err(SimError::InvalidTime(entry.delay));
            }
            if entry.delay < 0.0 {
                return Err(SimError::NegativeDelay {
                    event: self.name.clone(),
                    delay: entry.delay,
                });
            }
        }
        Ok(produced)
    }
}

impl<V> fmt::Debug for Event<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("inflow", &self.inflow)
            .field("outflow", &self.outflow)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}
