//! 令牌：带可用时间戳的不可变取值。
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::ids::{PlaceId, TokenId};

/// Simulated time. Always finite; see [`check_time`].
pub type Time = f64;

/// A value resting in a place, usable from `time` onwards.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token<V> {
    pub id: TokenId,
    pub value: V,
    pub time: Time,
}

impl<V> Token<V> {
    pub fn new(id: TokenId, value: V, time: Time) -> Self {
        Self { id, value, time }
    }
}

impl<V: fmt::Debug> fmt::Debug for Token<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}{:?}", self.value, self.time, self.id)
    }
}

/// Address of one token: the place holding it and its identity there.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TokenRef {
    pub place: PlaceId,
    pub token: TokenId,
}

impl TokenRef {
    pub fn new(place: PlaceId, token: TokenId) -> Self {
        Self { place, token }
    }
}

/// Total order over timestamps, usable as a map key.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TimeKey(pub Time);

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Rejects NaN and infinite timestamps.
pub(crate) fn check_time(time: Time) -> Option<Time> {
    time.is_finite().then_some(time)
}
