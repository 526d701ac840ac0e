//! Showdown distribution over constructed all-in states.

use holdem_table::cards::parse_cards;
use holdem_table::hand::{Board, HoleCards};
use holdem_table::state::{
    BetState, Event, PlayerState, PlayerStatus, PokerState, TableStatus,
};
use holdem_table::transition::{apply_event, TableRules};

fn player(id: &str, status: PlayerStatus, total: u64, hole: &str) -> PlayerState {
    let cards = parse_cards(hole).expect("valid hole cards");
    PlayerState {
        id: id.to_string(),
        status,
        hole: Some(HoleCards::try_new(cards[0], cards[1]).expect("distinct hole cards")),
        chips: 0,
        bet: BetState { round: 0, total },
    }
}

fn at_showdown(players: Vec<PlayerState>, board: &str) -> PokerState {
    let mut state = PokerState::new();
    state.pot = players.iter().map(|p| p.bet.total).sum();
    state.dealer_id = Some(players[0].id.clone());
    state.players = players;
    state.status = TableStatus::Playing;
    state.community =
        Board::try_from_cards(parse_cards(board).expect("valid board")).expect("legal board");
    state
}

fn resolve(state: &PokerState) -> PokerState {
    apply_event(state, &Event::TransitionPhase, &TableRules::default(), 0)
        .expect("showdown should resolve")
}

#[test]
fn short_stack_wins_main_pot_only() {
    // a and b are all-in for 100, c for 30. c has the best hand but can
    // only win the 90-chip main pot; the 140-chip side pot goes to the
    // better of a and b.
    let state = at_showdown(
        vec![
            player("a", PlayerStatus::AllIn, 100, "As Kd"),
            player("b", PlayerStatus::AllIn, 100, "Qs Qh"),
            player("c", PlayerStatus::AllIn, 30, "9s 9c"),
        ],
        "2c 7d 9h Jc 3s",
    );
    let state = resolve(&state);

    assert_eq!(state.status, TableStatus::RoundOver);
    assert_eq!(state.player("c").unwrap().chips, 90, "trips take the main pot");
    assert_eq!(state.player("b").unwrap().chips, 140, "queens take the side pot");
    assert_eq!(state.player("a").unwrap().chips, 0);
    assert_eq!(state.pot, 0);
}

#[test]
fn tied_winners_split_with_odd_chip_left_of_dealer() {
    // Everyone plays the board flush; the folder's 25 chips are dead
    // money. 75 split two ways leaves an odd chip for the first winner
    // left of the dealer.
    let state = at_showdown(
        vec![
            player("a", PlayerStatus::Folded, 25, "2h 3c"),
            player("b", PlayerStatus::AllIn, 25, "2c 3d"),
            player("c", PlayerStatus::AllIn, 25, "4c 5d"),
        ],
        "Ah Kh Qh Jh 9h",
    );
    let state = resolve(&state);

    assert_eq!(state.player("b").unwrap().chips, 38);
    assert_eq!(state.player("c").unwrap().chips, 37);
    assert_eq!(state.player("a").unwrap().chips, 0);
}

#[test]
fn folded_overage_folds_into_top_pot() {
    // a committed 50 then folded; only 40 of it is matched by a level,
    // so the extra 10 rides along with the top pot.
    let state = at_showdown(
        vec![
            player("a", PlayerStatus::Folded, 50, "2h 3c"),
            player("b", PlayerStatus::AllIn, 40, "Ks Kd"),
            player("c", PlayerStatus::AllIn, 40, "8s 7d"),
        ],
        "Kc 9d 5h 4s 2s",
    );
    let state = resolve(&state);

    assert_eq!(state.player("b").unwrap().chips, 130, "trip kings scoop everything");
    assert_eq!(state.player("c").unwrap().chips, 0);
}

#[test]
fn lone_survivor_takes_pot_without_contest() {
    let state = at_showdown(
        vec![
            player("a", PlayerStatus::Folded, 60, "2h 3c"),
            player("b", PlayerStatus::Playing, 60, "7s 2d"),
        ],
        "Ah Kd Qc 9s 5h",
    );
    let state = resolve(&state);
    assert_eq!(state.player("b").unwrap().chips, 120);
}

#[test]
fn mismatched_active_bets_are_rejected() {
    let state = at_showdown(
        vec![
            player("a", PlayerStatus::Playing, 80, "As Kd"),
            player("b", PlayerStatus::Playing, 60, "Qs Qh"),
        ],
        "2c 7d 9h Jc 3s",
    );
    let err = apply_event(&state, &Event::TransitionPhase, &TableRules::default(), 0)
        .expect_err("unequal live bets must not reach payout");
    assert!(matches!(
        err,
        holdem_table::state::EngineError::InconsistentState(_)
    ));
}
