//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `turn`: A single immutable conversation turn (`Turn`, `TurnRole`)
//! - `turn_log`: The append-only, per-surface transcript (`TurnLog`)
//!
//! # Usage
//!
//! ```
//! use mindease_core::conversation::{Turn, TurnLog, TurnRole};
//!
//! let mut log = TurnLog::seeded(Turn::assistant("Hello! How are you feeling today?").unwrap());
//! log.append(Turn::user("A bit tired").unwrap());
//! assert_eq!(log.len(), 2);
//! assert_eq!(log.snapshot()[1].role(), TurnRole::User);
//! ```

mod turn;
mod turn_log;

pub use turn::{Turn, TurnRole};
pub use turn_log::TurnLog;
