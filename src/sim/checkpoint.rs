//! 检查点：全部库所令牌集合与时钟的快照。
//!
//! 内存检查点与活动状态按库所共享令牌存储（写时复制）；持久化形式为
//! `时钟 + [(库所名, 变体, [(值, 时间戳)])]`，令牌按变体要求的顺序排列。
use serde::{Deserialize, Serialize};

use crate::sim::ids::PlaceId;
use crate::sim::index_vec::IndexVec;
use crate::sim::place::{PlaceCheckpoint, PlaceKind};
use crate::sim::token::Time;

/// In-memory snapshot of a [`Problem`](crate::sim::Problem).
///
/// Restoring does not consume it; several may coexist.
pub struct Checkpoint<V> {
    pub(crate) clock: Time,
    pub(crate) places: IndexVec<PlaceId, PlaceCheckpoint<V>>,
}

impl<V> Clone for Checkpoint<V> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock,
            places: self.places.iter().cloned().collect(),
        }
    }
}

impl<V> Checkpoint<V> {
    pub fn clock(&self) -> Time {
        self.clock
    }

    pub fn place(&self, place: PlaceId) -> Option<&PlaceCheckpoint<V>> {
        self.places.get(place)
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }
}

/// Serializable form of a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCheckpoint<V> {
    pub clock: Time,
    pub places: Vec<PersistedPlace<V>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPlace<V> {
    pub id: String,
    pub kind: PlaceKind,
    /// `(value, timestamp)` in the order the variant offers them.
    pub tokens: Vec<(V, Time)>,
}
