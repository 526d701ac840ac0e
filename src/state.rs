//! Table state snapshot and the events that transform it.
//!
//! `PokerState` is a plain value: transitions never mutate a committed
//! snapshot, they build a new one (see `transition`). The serde shape of
//! [`Event`] and [`PlayerMove`] matches the external wire contract, e.g.
//! `{"type":"table","action":"join","playerId":"alice"}` and
//! `{"type":"move","playerId":"bob","move":{"type":"raise","amount":30}}`.

use crate::deck::Deck;
use crate::evaluator::EvalError;
use crate::hand::{Board, HoleCards};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = String;

/// Where the table is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Waiting,
    Playing,
    RoundOver,
}

/// A seated player's standing within the current hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    Playing,
    Folded,
    AllIn,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerStatus::Playing => "playing",
            PlayerStatus::Folded => "folded",
            PlayerStatus::AllIn => "all-in",
        };
        f.write_str(s)
    }
}

/// Chips a player has committed, split by betting round and whole hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetState {
    /// Committed during the current betting round.
    pub round: u64,
    /// Committed during the whole hand; drives side-pot levels.
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    pub status: PlayerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole: Option<HoleCards>,
    pub chips: u64,
    pub bet: BetState,
}

impl PlayerState {
    pub fn new(id: impl Into<PlayerId>, chips: u64) -> Self {
        Self {
            id: id.into(),
            status: PlayerStatus::Playing,
            hole: None,
            chips,
            bet: BetState::default(),
        }
    }
}

/// The authoritative table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerState {
    pub status: TableStatus,
    pub players: Vec<PlayerState>,
    pub current_player_index: usize,
    pub deck: Deck,
    pub community: Board,
    pub pot: u64,
    pub bet: u64,
    /// None only before the first hand has been dealt.
    pub dealer_id: Option<PlayerId>,
}

impl PokerState {
    pub fn new() -> Self {
        Self {
            status: TableStatus::Waiting,
            players: Vec::new(),
            current_player_index: 0,
            deck: Deck::standard(),
            community: Board::new(),
            pot: 0,
            bet: 0,
            dealer_id: None,
        }
    }

    pub fn player_index(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn current_player(&self) -> Option<&PlayerState> {
        self.players.get(self.current_player_index)
    }

    /// Chips in circulation: stacks plus the pot. Constant within a hand.
    pub fn total_chips(&self) -> u64 {
        self.players.iter().map(|p| p.chips).sum::<u64>() + self.pot
    }
}

impl Default for PokerState {
    fn default() -> Self {
        Self::new()
    }
}

/// A player's betting decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerMove {
    Fold,
    Call,
    Raise { amount: u64 },
    AllIn,
}

impl fmt::Display for PlayerMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerMove::Fold => f.write_str("fold"),
            PlayerMove::Call => f.write_str("call"),
            PlayerMove::Raise { amount } => write!(f, "raise to {amount}"),
            PlayerMove::AllIn => f.write_str("all-in"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableAction {
    Join,
    Leave,
}

/// Everything that can be submitted to a table. `Start` and
/// `TransitionPhase` are system events; external callers send only
/// `Table` and `Move`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Table {
        action: TableAction,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    Move {
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        #[serde(rename = "move")]
        action: PlayerMove,
    },
    Start,
    TransitionPhase,
}

impl Event {
    pub fn join(player_id: impl Into<PlayerId>) -> Self {
        Event::Table { action: TableAction::Join, player_id: player_id.into() }
    }

    pub fn leave(player_id: impl Into<PlayerId>) -> Self {
        Event::Table { action: TableAction::Leave, player_id: player_id.into() }
    }

    pub fn player_move(player_id: impl Into<PlayerId>, action: PlayerMove) -> Self {
        Event::Move { player_id: player_id.into(), action }
    }
}

/// Why an event was refused. `NotYourTurn`, `TableLocked`, `RaiseTooLow`,
/// `UnknownPlayer` and `PlayerAlreadySeated` are recoverable rejections;
/// `InconsistentState` signals a violated internal invariant and should be
/// treated as a defect, not retried. In every case the previous snapshot
/// stays authoritative.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("table is locked during play")]
    TableLocked,
    #[error("unknown player: '{0}'")]
    UnknownPlayer(PlayerId),
    #[error("player already seated: '{0}'")]
    PlayerAlreadySeated(PlayerId),
    #[error("raise must exceed the table bet: bet {bet}, got {got}")]
    RaiseTooLow { bet: u64, got: u64 },
    #[error("need at least {need} players, have {have}")]
    NotEnoughPlayers { need: usize, have: usize },
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("room is closed")]
    RoomClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_wire_shape_matches_contract() {
        let join: Event = serde_json::from_value(json!({
            "type": "table", "action": "join", "playerId": "alice"
        }))
        .unwrap();
        assert_eq!(join, Event::join("alice"));

        let raise: Event = serde_json::from_value(json!({
            "type": "move", "playerId": "bob", "move": {"type": "raise", "amount": 30}
        }))
        .unwrap();
        assert_eq!(raise, Event::player_move("bob", PlayerMove::Raise { amount: 30 }));

        let all_in = Event::player_move("bob", PlayerMove::AllIn);
        let v = serde_json::to_value(&all_in).unwrap();
        assert_eq!(v["move"]["type"], "all_in");
    }

    #[test]
    fn status_wire_names_are_screaming_snake() {
        assert_eq!(serde_json::to_value(TableStatus::RoundOver).unwrap(), "ROUND_OVER");
        assert_eq!(serde_json::to_value(PlayerStatus::AllIn).unwrap(), "ALL_IN");
    }

    #[test]
    fn fresh_state_is_waiting_and_empty() {
        let s = PokerState::new();
        assert_eq!(s.status, TableStatus::Waiting);
        assert!(s.players.is_empty());
        assert_eq!(s.deck.len(), 52);
        assert_eq!(s.total_chips(), 0);
        assert!(s.dealer_id.is_none());
    }
}
