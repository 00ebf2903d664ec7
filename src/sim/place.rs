//! 库所：三种令牌提供顺序（基本、队列、时间有序）共享同一增删约定。
//!
//! 令牌存放在 `Arc` 之后，检查点只复制指针；检查点存活期间的首次修改才会
//! 通过 `Arc::make_mut` 复制该库所的令牌集合。
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::sim::error::SimError;
use crate::sim::ids::TokenId;
use crate::sim::token::{Time, TimeKey, Token, check_time};

/// Which tokens a place offers to the binding search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceKind {
    /// Every token is a candidate.
    Basic,
    /// Only the earliest inserted token is a candidate, whatever its timestamp.
    Queue,
    /// Only the token with the smallest timestamp is a candidate; ties go to
    /// the earlier insertion.
    TimeOrdered,
}

#[derive(Clone)]
struct TokenStore<V> {
    // Keyed by allocation order, so iteration is insertion order.
    tokens: BTreeMap<TokenId, Token<V>>,
    by_time: BTreeSet<(TimeKey, TokenId)>,
}

impl<V> TokenStore<V> {
    fn empty() -> Self {
        Self {
            tokens: BTreeMap::new(),
            by_time: BTreeSet::new(),
        }
    }

    fn ordered(&self, kind: PlaceKind) -> Vec<&Token<V>> {
        match kind {
            PlaceKind::Basic | PlaceKind::Queue => self.tokens.values().collect(),
            PlaceKind::TimeOrdered => self
                .by_time
                .iter()
                .filter_map(|(_, id)| self.tokens.get(id))
                .collect(),
        }
    }
}

pub struct Place<V> {
    name: String,
    kind: PlaceKind,
    store: Arc<TokenStore<V>>,
    // Lives outside the shared store: restoring a checkpoint never hands
    // out an id twice.
    next_id: u64,
}

/// Frozen token set of one place.
pub struct PlaceCheckpoint<V> {
    kind: PlaceKind,
    store: Arc<TokenStore<V>>,
}

impl<V> Clone for PlaceCheckpoint<V> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: Arc::clone(&self.store),
        }
    }
}

impl<V> PlaceCheckpoint<V> {
    pub fn kind(&self) -> PlaceKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.store.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.tokens.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token<V>> {
        self.store.tokens.values()
    }

    /// Tokens in the order the place variant offers them.
    pub fn ordered_tokens(&self) -> Vec<&Token<V>> {
        self.store.ordered(self.kind)
    }
}

impl<V> Place<V> {
    pub fn new(name: impl Into<String>, kind: PlaceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            store: Arc::new(TokenStore::empty()),
            next_id: 0,
        }
    }

    /// An empty place with the same name and variant that continues this
    /// place's id sequence.
    pub(crate) fn emptied(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            store: Arc::new(TokenStore::empty()),
            next_id: self.next_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PlaceKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.store.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.tokens.is_empty()
    }

    pub fn get(&self, id: TokenId) -> Option<&Token<V>> {
        self.store.tokens.get(&id)
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.store.tokens.contains_key(&id)
    }

    /// Tokens in insertion order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token<V>> {
        self.store.tokens.values()
    }

    /// Tokens in the order this variant offers them: insertion order for
    /// basic and queue places, timestamp order for time-ordered places.
    pub fn ordered_tokens(&self) -> Vec<&Token<V>> {
        self.store.ordered(self.kind)
    }

    /// The token this place offers first.
    pub fn head(&self) -> Option<&Token<V>> {
        match self.kind {
            PlaceKind::Basic | PlaceKind::Queue => self.store.tokens.values().next(),
            PlaceKind::TimeOrdered => self
                .store
                .by_time
                .first()
                .and_then(|(_, id)| self.store.tokens.get(id)),
        }
    }

    /// Tokens eligible to fill the `occurrence`-th arc (counting from 0)
    /// from this place into one event. Basic places offer every token.
    /// Ordered variants offer one token: the head for the first arc, the
    /// next token in order for the second, and so on.
    pub fn candidates(&self, occurrence: usize) -> SmallVec<[&Token<V>; 1]> {
        let offered = match self.kind {
            PlaceKind::Basic => return self.tokens().collect(),
            PlaceKind::Queue => self.store.tokens.values().nth(occurrence),
            PlaceKind::TimeOrdered => self
                .store
                .by_time
                .iter()
                .nth(occurrence)
                .and_then(|(_, id)| self.store.tokens.get(id)),
        };
        offered.into_iter().collect()
    }

    pub fn store_checkpoint(&self) -> PlaceCheckpoint<V> {
        PlaceCheckpoint {
            kind: self.kind,
            store: Arc::clone(&self.store),
        }
    }

    pub fn restore_checkpoint(&mut self, checkpoint: &PlaceCheckpoint<V>) -> Result<(), SimError> {
        if checkpoint.kind != self.kind {
            return Err(SimError::CheckpointMismatch(format!(
                "place `{}` is {:?}, checkpoint holds {:?}",
                self.name, self.kind, checkpoint.kind
            )));
        }
        self.store = Arc::clone(&checkpoint.store);
        Ok(())
    }
}

impl<V: Clone> Place<V> {
    pub fn add(&mut self, value: V, time: Time) -> Result<TokenId, SimError> {
        let time = check_time(time).ok_or(SimError::InvalidTime(time))?;
        let id = TokenId(self.next_id);
        self.next_id += 1;
        let store = Arc::make_mut(&mut self.store);
        store.by_time.insert((TimeKey(time), id));
        store.tokens.insert(id, Token::new(id, value, time));
        Ok(id)
    }

    pub fn remove(&mut self, id: TokenId) -> Result<Token<V>, SimError> {
        if !self.contains(id) {
            return Err(SimError::TokenNotFound {
                place: self.name.clone(),
                token: id,
            });
        }
        let store = Arc::make_mut(&mut self.store);
        let token = store
            .tokens
            .remove(&id)
            .ok_or_else(|| SimError::TokenNotFound {
                place: self.name.clone(),
                token: id,
            })?;
        store.by_time.remove(&(TimeKey(token.time), id));
        Ok(token)
    }
}

impl<V: fmt::Debug> fmt::Debug for Place<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Place")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("tokens", &self.store.tokens.values().collect::<Vec<_>>())
            .finish()
    }
}
