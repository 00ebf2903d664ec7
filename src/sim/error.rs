//! 仿真内核错误类型。
use thiserror::Error;

use crate::sim::ids::{EventId, PlaceId, TokenId};
use crate::sim::token::Time;

/// Coarse classification of [`SimError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NotFound,
    Causality,
    GuardEvaluation,
    OutflowEvaluation,
    Reporter,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("place `{0}` is already defined")]
    DuplicatePlace(String),
    #[error("event `{0}` is already defined")]
    DuplicateEvent(String),
    #[error("place {0:?} is not part of this problem")]
    UnknownPlace(PlaceId),
    #[error("event {0:?} is not part of this problem")]
    UnknownEvent(EventId),
    #[error("event `{0}` has no input places")]
    EmptyInflow(String),
    #[error("outflow of event `{event}` returned {actual} entries for {expected} output places")]
    Arity {
        event: String,
        expected: usize,
        actual: usize,
    },
    #[error("outflow of event `{event}` produced negative delay {delay}")]
    NegativeDelay { event: String, delay: Time },
    #[error("timestamp {0} is not a finite number")]
    InvalidTime(Time),
    #[error("checkpoint does not match this problem: {0}")]
    CheckpointMismatch(String),
    #[error("token {token:?} is offered twice to event `{event}`")]
    DuplicateToken { event: String, token: TokenId },
    #[error("token {token:?} is not present in place `{place}`")]
    TokenNotFound { place: String, token: TokenId },
    #[error("event `{event}` would fire at {time}, before the clock at {clock}")]
    Causality {
        event: String,
        time: Time,
        clock: Time,
    },
    #[error("event `{event}` would fire at {time}, before its token at {available} is available")]
    Premature {
        event: String,
        time: Time,
        available: Time,
    },
    #[error("guard of event `{event}` rejects the offered tokens")]
    GuardRejected { event: String },
    #[error("guard of event `{event}` failed: {source}")]
    Guard {
        event: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("outflow of event `{event}` failed: {source}")]
    Outflow {
        event: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("reporter failed at time {time}: {source}")]
    Reporter {
        time: Time,
        #[source]
        source: anyhow::Error,
    },
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::DuplicatePlace(_)
            | SimError::DuplicateEvent(_)
            | SimError::UnknownPlace(_)
            | SimError::UnknownEvent(_)
            | SimError::EmptyInflow(_)
            | SimError::Arity { .. }
            | SimError::NegativeDelay { .. }
            | SimError::InvalidTime(_)
            | SimError::CheckpointMismatch(_)
            | SimError::DuplicateToken { .. } => ErrorKind::Configuration,
            SimError::TokenNotFound { .. } => ErrorKind::NotFound,
            SimError::Causality { .. } | SimError::Premature { .. } => ErrorKind::Causality,
            SimError::Guard { .. } | SimError::GuardRejected { .. } => ErrorKind::GuardEvaluation,
            SimError::Outflow { .. } => ErrorKind::OutflowEvaluation,
            SimError::Reporter { .. } => ErrorKind::Reporter,
        }
    }
}
