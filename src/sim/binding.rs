//! 绑定搜索：对事件输入库所的候选令牌做惰性笛卡尔积，按守卫过滤，
//! 只保留最早可激发时间的组合。
//!
//! 设输入库所 `P1..Pn` 的候选集合为 `C1..Cn`（基本库所为全部令牌，队列与
//! 时间有序库所仅为队首令牌；同一有序库所第 k 次出现时取其顺序中的第 k 个
//! 令牌），则候选绑定为 `C1 × … × Cn` 中满足守卫的元组，其时间为
//! `max(clock, max_i time_i)`。任一 `Ci` 为空时不产生任何元组。
use smallvec::SmallVec;

use crate::sim::error::SimError;
use crate::sim::event::Event;
use crate::sim::ids::{EventId, PlaceId};
use crate::sim::index_vec::IndexVec;
use crate::sim::place::Place;
use crate::sim::token::{Time, Token, TokenRef};

pub type Priority = i32;

/// Priority every event starts with. Lower values win.
pub const DEFAULT_PRIORITY: Priority = 0;

/// One guard-satisfying choice of a token per input place of `event`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub event: EventId,
    /// One entry per input place, in inflow order.
    pub tokens: SmallVec<[TokenRef; 4]>,
    pub time: Time,
    pub priority: Priority,
}

/// A tuple yielded by [`TokenCombinations`]: one token per place, in the
/// order the places were given.
pub type Combination<'a, V> = SmallVec<[(PlaceId, &'a Token<V>); 4]>;

/// Lazy cross product over the candidate tokens of a list of places.
///
/// The first place varies slowest. Nothing is yielded when any place has no
/// candidate, or when the list of places is empty.
pub struct TokenCombinations<'a, V> {
    places: SmallVec<[PlaceId; 4]>,
    slots: Vec<SmallVec<[&'a Token<V>; 1]>>,
    cursor: SmallVec<[usize; 4]>,
    exhausted: bool,
}

impl<'a, V> Iterator for TokenCombinations<'a, V> {
    type Item = Combination<'a, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let combination = self
            .places
            .iter()
            .zip(&self.slots)
            .zip(&self.cursor)
            .map(|((place, slot), &idx)| (*place, slot[idx]))
            .collect();

        // advance the odometer, last slot fastest
        self.exhausted = true;
        for pos in (0..self.cursor.len()).rev() {
            self.cursor[pos] += 1;
            if self.cursor[pos] < self.slots[pos].len() {
                self.exhausted = false;
                break;
            }
            self.cursor[pos] = 0;
        }
        Some(combination)
    }
}

/// Every combination of one candidate token per place.
///
/// A place listed more than once contributes its candidates for each
/// listing separately; see [`Place::candidates`].
pub fn tokens_combinations<'a, V, I>(places: I) -> TokenCombinations<'a, V>
where
    I: IntoIterator<Item = (PlaceId, &'a Place<V>)>,
    V: 'a,
{
    let mut seen: SmallVec<[PlaceId; 4]> = SmallVec::new();
    let (ids, slots): (SmallVec<[PlaceId; 4]>, Vec<_>) = places
        .into_iter()
        .map(|(id, place)| {
            let occurrence = seen.iter().filter(|&&earlier| earlier == id).count();
            seen.push(id);
            (id, place.candidates(occurrence))
        })
        .unzip();
    let exhausted = slots.is_empty() || slots.iter().any(|slot| slot.is_empty());
    TokenCombinations {
        cursor: SmallVec::from_elem(0, slots.len()),
        places: ids,
        slots,
        exhausted,
    }
}

/// Candidate bindings of one event that share its earliest enabling time.
///
/// Combinations naming the same token twice (an event reading one place
/// through two arcs) are skipped. A combination later than the best time
/// found so far is dropped before its guard runs, so a guard is not
/// called on every combination and its errors surface only for the
/// combinations it is asked about.
pub(crate) fn min_time_bindings<V>(
    event_id: EventId,
    event: &Event<V>,
    places: &IndexVec<PlaceId, Place<V>>,
    clock: Time,
    priority: Priority,
) -> Result<Vec<Binding>, SimError> {
    let mut inputs = Vec::with_capacity(event.inflow().len());
    for &id in event.inflow() {
        let place = places.get(id).ok_or(SimError::UnknownPlace(id))?;
        inputs.push((id, place));
    }

    let mut best: Option<Time> = None;
    let mut bindings = Vec::new();
    let mut examined = 0usize;
    for combination in tokens_combinations(inputs) {
        examined += 1;
        let tokens: SmallVec<[TokenRef; 4]> = combination
            .iter()
            .map(|(place, token)| TokenRef::new(*place, token.id))
            .collect();
        if has_repeats(&tokens) {
            continue;
        }

        let time = combination
            .iter()
            .map(|(_, token)| token.time)
            .fold(clock, Time::max);
        if best.is_some_and(|best| time > best) {
            continue;
        }

        let values: SmallVec<[&V; 4]> = combination.iter().map(|(_, token)| &token.value).collect();
        if !event.accepts(&values)? {
            continue;
        }

        if best.is_none_or(|best| time < best) {
            best = Some(time);
            bindings.clear();
        }
        bindings.push(Binding {
            event: event_id,
            tokens,
            time,
            priority,
        });
    }
    log::trace!(
        "event `{}`: {} combinations examined, {} bindings at {:?}",
        event.name(),
        examined,
        bindings.len(),
        best
    );
    Ok(bindings)
}

fn has_repeats(tokens: &[TokenRef]) -> bool {
    tokens
        .iter()
        .enumerate()
        .any(|(idx, token)| tokens[..idx].contains(token))
}
