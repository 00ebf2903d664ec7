//! # 离散事件 Petri 网仿真内核
//!
//! 库所 `P` 持有带时间戳的令牌 `(v, t)`；事件 `e` 从其每个输入库所各取
//! 一个令牌，守卫 `g(v1..vn)` 为真时构成一个绑定，其时间为
//! `max(clock, t1..tn)`。每一步：
//!
//! 1. 对每个事件求最早时间的候选绑定（队列/时间有序库所只提供队首令牌）；
//! 2. 全局选择时间最小、优先级数值最小者，其余并列由 [`TieBreak`] 决定；
//! 3. 原子地发生：移除消费令牌，按产出函数在输出库所加入
//!    `(value, time + delay)`，时钟推进到绑定时间；
//! 4. 通知 [`Reporter`](crate::report::Reporter)。
//!
//! 检查点保存所有库所的令牌与时钟，可多次恢复。
//!
//! ## 示例
//!
//! ```rust
//! use simnet::report::FiringLog;
//! use simnet::sim::*;
//!
//! let mut problem = Problem::new();
//! let p = problem.add_var("p").unwrap();
//! let q = problem.add_var("q").unwrap();
//! problem
//!     .add_event("e", &[p], &[q], |v: &[&i32]| Ok(vec![Some(Produce::after(*v[0], 5.0))]))
//!     .unwrap();
//! problem.put(p, 1).unwrap();
//!
//! let mut log = FiringLog::<i32>::new();
//! assert!(problem.step(&mut log).unwrap().is_some());
//! assert_eq!(problem.clock(), 0.0);
//! let head = problem.place(q).unwrap().head().unwrap();
//! assert_eq!((head.value, head.time), (1, 5.0));
//! ```

pub mod binding;
pub mod checkpoint;
pub mod error;
pub mod event;
pub mod ids;
pub mod index_vec;
pub mod io;
pub mod place;
pub mod problem;
pub mod select;
pub mod token;

pub use binding::{Binding, Combination, DEFAULT_PRIORITY, Priority, TokenCombinations, tokens_combinations};
pub use checkpoint::{Checkpoint, PersistedCheckpoint, PersistedPlace};
pub use error::{ErrorKind, SimError};
pub use event::{Event, Guard, Outflow, Produce};
pub use ids::{EventId, PlaceId, TokenId};
pub use index_vec::{Idx, IndexVec};
pub use place::{Place, PlaceCheckpoint, PlaceKind};
pub use problem::{DiagnosticReport, Problem, RunLimits};
pub use select::{FirstEncountered, SeededRandom, TieBreak};
pub use token::{Time, Token, TokenRef};
