//! Pure derivations over a state snapshot. Nothing here mutates; every
//! function answers a question about a single `PokerState` value.

use crate::cards::Card;
use crate::state::{
    BetState, EngineError, PlayerId, PlayerState, PlayerStatus, PokerState, TableStatus,
};
use serde::{Deserialize, Serialize};

/// Seat of the current dealer, if a dealer has been assigned.
pub fn dealer_index(state: &PokerState) -> Option<usize> {
    let dealer_id = state.dealer_id.as_deref()?;
    state.player_index(dealer_id)
}

/// Seat that opens the betting for the current phase.
///
/// Heads-up preflop the dealer (who posts the small blind) acts first;
/// in every other configuration action opens three seats after the
/// dealer, i.e. directly behind the blinds.
pub fn first_to_act(state: &PokerState) -> Option<usize> {
    let dealer = dealer_index(state)?;
    let n = state.players.len();
    if n == 0 {
        return None;
    }
    if n == 2 && state.community.is_empty() {
        Some(dealer)
    } else {
        Some((dealer + 3) % n)
    }
}

/// Seat order for the current phase: all seats, rotated so the
/// first-to-act seat sits at index 0.
pub fn rotation(state: &PokerState) -> Vec<usize> {
    let n = state.players.len();
    match first_to_act(state) {
        Some(start) => (0..n).map(|i| (start + i) % n).collect(),
        None => (0..n).collect(),
    }
}

/// The big blind sits directly after the dealer.
pub fn big_blind_index(state: &PokerState) -> Option<usize> {
    let dealer = dealer_index(state)?;
    let n = state.players.len();
    (n > 0).then(|| (dealer + 1) % n)
}

/// The small blind sits two seats after the dealer; heads-up this wraps
/// back onto the dealer.
pub fn small_blind_index(state: &PokerState) -> Option<usize> {
    let dealer = dealer_index(state)?;
    let n = state.players.len();
    (n > 0).then(|| (dealer + 2) % n)
}

/// What one player is allowed to see about an opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentView {
    pub id: PlayerId,
    pub status: PlayerStatus,
    pub chips: u64,
    pub bet: BetState,
}

/// A per-player projection of the table: the requester's own cards and
/// full state, plus only the public parts of everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub status: TableStatus,
    pub community: Vec<Card>,
    pub pot: u64,
    pub bet: u64,
    pub dealer_id: Option<PlayerId>,
    pub small_blind_id: Option<PlayerId>,
    pub big_blind_id: Option<PlayerId>,
    pub current_player_id: Option<PlayerId>,
    pub me: PlayerState,
    pub opponents: Vec<OpponentView>,
}

/// Project the snapshot for one player, hiding everyone else's hole cards.
pub fn player_view(state: &PokerState, player_id: &str) -> Result<PlayerView, EngineError> {
    let me = state
        .player(player_id)
        .cloned()
        .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;

    let seat_id = |seat: Option<usize>| -> Option<PlayerId> {
        seat.and_then(|i| state.players.get(i)).map(|p| p.id.clone())
    };

    let opponents = state
        .players
        .iter()
        .filter(|p| p.id != player_id)
        .map(|p| OpponentView { id: p.id.clone(), status: p.status, chips: p.chips, bet: p.bet })
        .collect();

    Ok(PlayerView {
        status: state.status,
        community: state.community.as_slice().to_vec(),
        pot: state.pot,
        bet: state.bet,
        dealer_id: state.dealer_id.clone(),
        small_blind_id: seat_id(small_blind_index(state)),
        big_blind_id: seat_id(big_blind_index(state)),
        current_player_id: (state.status == TableStatus::Playing)
            .then(|| state.current_player().map(|p| p.id.clone()))
            .flatten(),
        me,
        opponents,
    })
}
