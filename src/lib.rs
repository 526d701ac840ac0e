//! holdem-table: a deterministic Texas Hold'em table engine
//!
//! Goals:
//! - Pure state machine: every transition maps one immutable snapshot to
//!   the next, so replaying an event log reproduces a table exactly
//! - No panics for invalid input; use `Result` for recoverable errors
//! - One async [`room`](crate::room) actor per table that serializes
//!   event application over the pure core
//!
//! ## Quick start: drive a heads-up hand
//! ```
//! use holdem_table::state::{Event, PlayerMove, PokerState, TableStatus};
//! use holdem_table::transition::{apply_event, TableRules};
//!
//! let rules = TableRules::default();
//! let state = PokerState::new();
//! let state = apply_event(&state, &Event::join("alice"), &rules, 0).unwrap();
//! let state = apply_event(&state, &Event::join("bob"), &rules, 0).unwrap();
//! let state = apply_event(&state, &Event::Start, &rules, 42).unwrap();
//!
//! assert_eq!(state.status, TableStatus::Playing);
//! assert_eq!(state.pot, 30); // 10/20 blinds posted
//!
//! // Heads-up the dealer posts the small blind and acts first.
//! let state = apply_event(
//!     &state,
//!     &Event::player_move("alice", PlayerMove::Fold),
//!     &rules,
//!     0,
//! ).unwrap();
//! assert_eq!(state.status, TableStatus::RoundOver);
//! ```

pub mod cards;
pub mod deck;
pub mod evaluator;
pub mod hand;
pub mod query;
pub mod room;
pub mod state;
pub mod transition;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
