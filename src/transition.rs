//! The state machine: every function takes a committed snapshot and
//! produces a complete new one. Nothing in here touches shared state;
//! serialization of event application is the room's job.

use crate::deck::Deck;
use crate::evaluator::best_hands;
use crate::hand::HoleCards;
use crate::query::{big_blind_index, dealer_index, first_to_act, rotation, small_blind_index};
use crate::state::{
    EngineError, Event, PlayerMove, PlayerStatus, PokerState, TableAction, TableStatus,
};

/// Table parameters fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRules {
    /// Seats required before a hand may be dealt (never below 2).
    pub min_players: usize,
    pub starting_chips: u64,
    pub small_blind: u64,
    pub big_blind: u64,
}

impl Default for TableRules {
    fn default() -> Self {
        Self { min_players: 2, starting_chips: 1000, small_blind: 10, big_blind: 20 }
    }
}

/// Apply one event to a snapshot, producing the next snapshot or a typed
/// rejection. On error the input snapshot is untouched and remains the
/// authoritative state. `seed` determines the shuffle when the event
/// deals a fresh hand; it is ignored otherwise.
pub fn apply_event(
    state: &PokerState,
    event: &Event,
    rules: &TableRules,
    seed: u64,
) -> Result<PokerState, EngineError> {
    let mut next = state.clone();
    match event {
        Event::Table { action: TableAction::Join, player_id } => {
            add_player(&mut next, rules, player_id)?;
        }
        Event::Table { action: TableAction::Leave, player_id } => {
            remove_player(&mut next, player_id)?;
        }
        Event::Move { player_id, action } => {
            apply_move(&mut next, player_id, action)?;
        }
        Event::Start => {
            start_hand(&mut next, rules, seed)?;
        }
        Event::TransitionPhase => {
            if next.status == TableStatus::Playing {
                progress(&mut next)?;
            }
        }
    }
    Ok(next)
}

/// Seat a new player with the configured starting stack. Only legal while
/// the table is not mid-hand.
fn add_player(
    state: &mut PokerState,
    rules: &TableRules,
    player_id: &str,
) -> Result<(), EngineError> {
    if state.status == TableStatus::Playing {
        return Err(EngineError::TableLocked);
    }
    if state.player(player_id).is_some() {
        return Err(EngineError::PlayerAlreadySeated(player_id.to_string()));
    }
    state
        .players
        .push(crate::state::PlayerState::new(player_id, rules.starting_chips));
    Ok(())
}

/// Remove a seated player. Only legal while the table is not mid-hand.
/// The current-player index and dealer assignment are re-anchored so the
/// remaining seats stay addressable.
fn remove_player(state: &mut PokerState, player_id: &str) -> Result<(), EngineError> {
    if state.status == TableStatus::Playing {
        return Err(EngineError::TableLocked);
    }
    let idx = state
        .player_index(player_id)
        .ok_or_else(|| EngineError::UnknownPlayer(player_id.to_string()))?;
    state.players.remove(idx);

    let n = state.players.len();
    if idx < state.current_player_index {
        state.current_player_index -= 1;
    }
    if state.current_player_index >= n {
        state.current_player_index = 0;
    }

    if state.dealer_id.as_deref() == Some(player_id) {
        // Hand the button to the seat before the vacated one so the next
        // rotation lands where it would have anyway.
        state.dealer_id = if n == 0 {
            None
        } else {
            Some(state.players[(idx + n - 1) % n].id.clone())
        };
    }
    Ok(())
}

/// Begin a fresh hand: shuffle and deal, rotate the button, collect
/// blinds. The table must be out of play and hold at least two players.
fn start_hand(state: &mut PokerState, rules: &TableRules, seed: u64) -> Result<(), EngineError> {
    if state.status == TableStatus::Playing {
        return Err(EngineError::TableLocked);
    }
    let need = rules.min_players.max(2);
    if state.players.len() < need {
        return Err(EngineError::NotEnoughPlayers { need, have: state.players.len() });
    }
    deal_cards(state, seed)?;
    rotate_blinds(state)?;
    collect_blinds(state, rules)?;
    // A short-stacked blind can be all-in before anyone acts; if that
    // was the opening seat, the hand resolves without it.
    if state.players[state.current_player_index].status != PlayerStatus::Playing {
        progress(state)?;
    }
    Ok(())
}

/// Reshuffle a full deck and deal two hole cards to every seat in order.
/// Clears the community and resets all per-hand accounting.
fn deal_cards(state: &mut PokerState, seed: u64) -> Result<(), EngineError> {
    let mut deck = Deck::shuffled(seed);
    state.community.clear();
    state.pot = 0;
    state.bet = 0;
    for player in &mut state.players {
        let (a, b) = match (deck.draw(), deck.draw()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(EngineError::InconsistentState("deck exhausted dealing".into())),
        };
        player.hole = Some(
            HoleCards::try_new(a, b)
                .map_err(|e| EngineError::InconsistentState(e.to_string()))?,
        );
        player.status = PlayerStatus::Playing;
        player.bet = Default::default();
    }
    state.deck = deck;
    state.status = TableStatus::Playing;
    Ok(())
}

/// Advance the button one seat (first seat on the very first hand) and
/// point the action at the first-to-act seat.
fn rotate_blinds(state: &mut PokerState) -> Result<(), EngineError> {
    let n = state.players.len();
    let next_dealer = match dealer_index(state) {
        Some(i) => (i + 1) % n,
        None => 0,
    };
    state.dealer_id = Some(state.players[next_dealer].id.clone());
    state.current_player_index = first_to_act(state)
        .ok_or_else(|| EngineError::InconsistentState("no first-to-act seat".into()))?;
    Ok(())
}

/// Post the small blind, then the big blind, through the betting
/// primitive so short stacks go all-in correctly.
fn collect_blinds(state: &mut PokerState, rules: &TableRules) -> Result<(), EngineError> {
    let sb = small_blind_index(state)
        .ok_or_else(|| EngineError::InconsistentState("no small blind seat".into()))?;
    let bb = big_blind_index(state)
        .ok_or_else(|| EngineError::InconsistentState("no big blind seat".into()))?;
    player_bet(state, sb, rules.small_blind);
    player_bet(state, bb, rules.big_blind);
    Ok(())
}

/// The betting primitive: bring one seat's round bet up to `target`,
/// capped by their remaining chips. Updates the pot and the table-high
/// bet, and flips the seat to all-in at zero chips.
fn player_bet(state: &mut PokerState, seat: usize, target: u64) {
    let player = &mut state.players[seat];
    let need = target.saturating_sub(player.bet.round);
    let pay = need.min(player.chips);
    player.chips -= pay;
    player.bet.round += pay;
    player.bet.total += pay;
    if player.chips == 0 {
        player.status = PlayerStatus::AllIn;
    }
    let round_bet = player.bet.round;
    state.pot += pay;
    if round_bet > state.bet {
        state.bet = round_bet;
    }
}

/// Validate and apply one player's move, then run round progression.
fn apply_move(
    state: &mut PokerState,
    player_id: &str,
    action: &PlayerMove,
) -> Result<(), EngineError> {
    if state.status != TableStatus::Playing {
        return Err(EngineError::NotYourTurn);
    }
    let seat = state.current_player_index;
    match state.current_player() {
        Some(p) if p.id == player_id => {}
        _ => return Err(EngineError::NotYourTurn),
    }

    match action {
        PlayerMove::Fold => state.players[seat].status = PlayerStatus::Folded,
        PlayerMove::Call => {
            let target = state.bet;
            player_bet(state, seat, target);
        }
        PlayerMove::Raise { amount } => {
            if *amount <= state.bet {
                return Err(EngineError::RaiseTooLow { bet: state.bet, got: *amount });
            }
            player_bet(state, seat, *amount);
        }
        PlayerMove::AllIn => {
            let target = state.players[seat].bet.round + state.players[seat].chips;
            player_bet(state, seat, target);
        }
    }
    progress(state)
}

fn count_with(state: &PokerState, f: impl Fn(PlayerStatus) -> bool) -> usize {
    state.players.iter().filter(|p| f(p.status)).count()
}

/// True when every seat still able to act has matched the table bet.
fn all_matched(state: &PokerState) -> bool {
    state
        .players
        .iter()
        .filter(|p| p.status == PlayerStatus::Playing)
        .all(|p| p.bet.round == state.bet)
}

/// Round progression, run after every applied move. A betting round ends
/// when action has come back around to the first-to-act seat with every
/// playing seat matched, when at most one non-folded seat can still act
/// (and owes nothing), or when a single non-folded seat remains. Rounds
/// that end advance the phase — repeatedly, which runs the board out for
/// all-in hands — or go to showdown from the river; otherwise the action
/// moves to the next playing seat.
fn progress(state: &mut PokerState) -> Result<(), EngineError> {
    loop {
        if count_with(state, |s| s != PlayerStatus::Folded) <= 1 {
            return showdown(state);
        }

        let playing = count_with(state, |s| s == PlayerStatus::Playing);
        let matched = all_matched(state);

        if playing <= 1 && matched {
            if state.community.len() == 5 {
                return showdown(state);
            }
            next_phase(state)?;
            continue;
        }

        let order = rotation(state);
        let n = order.len();
        let cur_pos = order
            .iter()
            .position(|&s| s == state.current_player_index)
            .ok_or_else(|| EngineError::InconsistentState("current seat out of range".into()))?;
        let next = (1..=n)
            .map(|k| (cur_pos + k) % n)
            .find(|&pos| state.players[order[pos]].status == PlayerStatus::Playing);
        let next_pos = match next {
            Some(pos) => pos,
            None => {
                // No playing seat left but not matched: the lone actor is
                // mid-resolution; treat as phase-complete.
                if state.community.len() == 5 {
                    return showdown(state);
                }
                next_phase(state)?;
                continue;
            }
        };

        // Wrapping past the first-to-act seat closes the round once all
        // playing seats have matched the table bet.
        if next_pos <= cur_pos && matched {
            if state.community.len() == 5 {
                return showdown(state);
            }
            next_phase(state)?;
            // The new street waits on its opener; keep looping only
            // while at most one seat can still act (all-in run-out).
            if count_with(state, |s| s == PlayerStatus::Playing) > 1 {
                return Ok(());
            }
            continue;
        }

        state.current_player_index = order[next_pos];
        return Ok(());
    }
}

/// Reveal the next street: burn one, then flop three or turn/river one.
/// Round bets and the table bet reset, and the action re-opens at the
/// phase's first-to-act seat.
fn next_phase(state: &mut PokerState) -> Result<(), EngineError> {
    if state.community.len() == 5 {
        return showdown(state);
    }
    let reveal = if state.community.is_empty() { 3 } else { 1 };
    if state.deck.len() < reveal + 1 {
        return Err(EngineError::InconsistentState("deck exhausted revealing".into()));
    }
    state.deck.burn();
    let cards = state.deck.draw_n(reveal);
    state.community.extend(cards);

    for player in &mut state.players {
        player.bet.round = 0;
    }
    state.bet = 0;
    state.current_player_index = first_to_act(state)
        .ok_or_else(|| EngineError::InconsistentState("no first-to-act seat".into()))?;
    // The nominal opener may have folded or be all-in; action starts at
    // the first seat in rotation order that can still act.
    if state.players[state.current_player_index].status != PlayerStatus::Playing {
        let order = rotation(state);
        if let Some(&seat) =
            order.iter().find(|&&s| state.players[s].status == PlayerStatus::Playing)
        {
            state.current_player_index = seat;
        }
    }
    Ok(())
}

/// Resolve the hand: run the board out to the river, carve the pot into
/// side-pot levels by committed totals, and award each level to the best
/// eligible hands. Odd chips go to tied winners in seat order starting
/// left of the dealer.
fn showdown(state: &mut PokerState) -> Result<(), EngineError> {
    // Still-active seats must share a single bet level; anything else
    // means the progression logic let an unmatched bet through.
    let mut active_totals: Vec<u64> = state
        .players
        .iter()
        .filter(|p| p.status == PlayerStatus::Playing)
        .map(|p| p.bet.total)
        .collect();
    active_totals.sort_unstable();
    active_totals.dedup();
    if active_totals.len() > 1 {
        return Err(EngineError::InconsistentState(format!(
            "distinct active bet levels at showdown: {active_totals:?}"
        )));
    }

    // Run the board out so every pot can be evaluated.
    while state.community.len() < 5 {
        let reveal = if state.community.is_empty() { 3 } else { 1 };
        if state.deck.len() < reveal + 1 {
            return Err(EngineError::InconsistentState("deck exhausted at showdown".into()));
        }
        state.deck.burn();
        let cards = state.deck.draw_n(reveal);
        state.community.extend(cards);
    }

    let n = state.players.len();
    let contenders: Vec<usize> = (0..n)
        .filter(|&i| state.players[i].status != PlayerStatus::Folded)
        .collect();

    // Side-pot levels: distinct committed totals of the non-folded seats,
    // ascending. Each level's slice collects every seat's contribution
    // within that band, so dead money from folders is paid out too; any
    // folded excess above the top level folds into the top slice.
    let mut levels: Vec<u64> = contenders
        .iter()
        .map(|&i| state.players[i].bet.total)
        .filter(|&t| t > 0)
        .collect();
    levels.sort_unstable();
    levels.dedup();

    let total_committed: u64 = state.players.iter().map(|p| p.bet.total).sum();
    if total_committed != state.pot {
        return Err(EngineError::InconsistentState(format!(
            "pot {} does not match committed total {}",
            state.pot, total_committed
        )));
    }

    let mut payouts = vec![0u64; n];
    let mut distributed = 0u64;
    let mut prev = 0u64;
    let last_level = levels.len().saturating_sub(1);
    for (k, &level) in levels.iter().enumerate() {
        let mut slice: u64 = state
            .players
            .iter()
            .map(|p| p.bet.total.min(level) - p.bet.total.min(prev))
            .sum();
        if k == last_level {
            // Fold residual contributions above the top level into the
            // final slice so every committed chip is paid out.
            slice += state
                .players
                .iter()
                .map(|p| p.bet.total.saturating_sub(level))
                .sum::<u64>();
        }
        prev = level;
        if slice == 0 {
            continue;
        }

        let eligible: Vec<(&str, &HoleCards)> = contenders
            .iter()
            .filter(|&&i| state.players[i].bet.total >= level)
            .filter_map(|&i| {
                state.players[i].hole.as_ref().map(|h| (state.players[i].id.as_str(), h))
            })
            .collect();
        if eligible.is_empty() {
            return Err(EngineError::InconsistentState(format!(
                "no eligible players for pot level {level}"
            )));
        }

        let winner_ids = best_hands(eligible, &state.community)?;
        let mut winner_seats: Vec<usize> = winner_ids
            .iter()
            .filter_map(|id| state.player_index(id))
            .collect();

        // Odd chips: seat order starting left of the dealer.
        let dealer = dealer_index(state).unwrap_or(0);
        winner_seats.sort_by_key(|&i| (i + n - (dealer + 1) % n) % n);

        let per = slice / winner_seats.len() as u64;
        let mut rem = slice % winner_seats.len() as u64;
        for &seat in &winner_seats {
            let mut amount = per;
            if rem > 0 {
                amount += 1;
                rem -= 1;
            }
            payouts[seat] += amount;
            distributed += amount;
        }
    }

    if distributed != state.pot {
        return Err(EngineError::InconsistentState(format!(
            "showdown distributed {} of a {} pot",
            distributed, state.pot
        )));
    }

    for (seat, amount) in payouts.into_iter().enumerate() {
        state.players[seat].chips += amount;
        if amount > 0 {
            log::debug!("seat {} ({}) wins {}", seat, state.players[seat].id, amount);
        }
    }
    state.pot = 0;
    state.bet = 0;
    for player in &mut state.players {
        player.bet.round = 0;
    }
    state.status = TableStatus::RoundOver;
    Ok(())
}
