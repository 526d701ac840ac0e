//! Driving a table end to end through the room orchestrator.

use holdem_table::room::{Room, RoomConfig};
use holdem_table::state::{EngineError, PlayerMove, TableStatus};

fn config(seed: u64) -> RoomConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    RoomConfig { shuffle_seed: Some(seed), ..RoomConfig::default() }
}

#[tokio::test]
async fn hand_plays_out_through_handles() {
    let room = Room::spawn(config(21));
    room.join("alice").await.unwrap();
    room.join("bob").await.unwrap();

    let state = room.current_state();
    assert_eq!(state.status, TableStatus::Playing);
    let total = state.total_chips();

    // Shove and call; the board runs out and the next hand is dealt
    // automatically if both players still have chips.
    let first = room.current_state().current_player().unwrap().id.clone();
    let second = if first == "alice" { "bob" } else { "alice" };
    room.play(first.as_str(), PlayerMove::AllIn).await.unwrap();
    let state = room.play(second, PlayerMove::Call).await.unwrap();
    assert_eq!(state.status, TableStatus::RoundOver);
    assert_eq!(state.pot, 0);
    assert_eq!(state.total_chips(), total);

    // One side holds every chip now, so the table must idle rather
    // than deal a hand the loser cannot play.
    let settled = room.current_state();
    if settled.players.iter().any(|p| p.chips == 0) {
        assert_ne!(settled.status, TableStatus::Playing);
    } else {
        assert_eq!(settled.status, TableStatus::Playing);
    }
}

#[tokio::test]
async fn events_from_many_handles_serialize() {
    let room = Room::spawn(RoomConfig {
        min_players: 4,
        shuffle_seed: Some(3),
        ..RoomConfig::default()
    });
    let mut joins = Vec::new();
    for i in 0..4 {
        let handle = room.clone();
        joins.push(tokio::spawn(async move {
            handle.join(format!("p{i}")).await
        }));
    }
    for join in joins {
        join.await.unwrap().unwrap();
    }
    let state = room.current_state();
    assert_eq!(state.players.len(), 4);
    assert_eq!(state.status, TableStatus::Playing, "fourth join triggers the deal");
}

#[tokio::test]
async fn table_below_minimum_waits() {
    let room = Room::spawn(RoomConfig {
        min_players: 3,
        shuffle_seed: Some(1),
        ..RoomConfig::default()
    });
    room.join("a").await.unwrap();
    room.join("b").await.unwrap();
    assert_eq!(room.current_state().status, TableStatus::Waiting);
    room.join("c").await.unwrap();
    assert_eq!(room.current_state().status, TableStatus::Playing);
}

#[tokio::test]
async fn subscriber_feed_tracks_commits_not_rejections() {
    let room = Room::spawn(config(8));
    let mut feed = room.subscribe();
    room.join("a").await.unwrap();
    let err = room.join("a").await.unwrap_err();
    assert!(matches!(err, EngineError::PlayerAlreadySeated(_)));
    room.join("b").await.unwrap();

    // Exactly three commits: two joins and the auto-start.
    assert_eq!(feed.recv().await.unwrap().players.len(), 1);
    assert_eq!(feed.recv().await.unwrap().players.len(), 2);
    assert_eq!(feed.recv().await.unwrap().status, TableStatus::Playing);
    assert!(matches!(
        feed.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn postflop_opener_is_the_non_dealer() {
    let room = Room::spawn(config(99));
    room.join("p0").await.unwrap();
    room.join("p1").await.unwrap();
    assert_eq!(room.current_state().dealer_id.as_deref(), Some("p0"));

    room.play("p0", PlayerMove::Call).await.unwrap();
    room.play("p1", PlayerMove::Raise { amount: 30 }).await.unwrap();
    room.play("p0", PlayerMove::Call).await.unwrap();
    let state = room.play("p1", PlayerMove::Call).await.unwrap();

    assert_eq!(state.community.len(), 3);
    assert_eq!(state.current_player().unwrap().id, "p1");
}

#[tokio::test]
async fn mid_hand_departure_is_refused() {
    let room = Room::spawn(config(2));
    room.join("a").await.unwrap();
    room.join("b").await.unwrap();
    assert_eq!(room.current_state().status, TableStatus::Playing);

    let err = room.leave("a").await.unwrap_err();
    assert!(matches!(err, EngineError::TableLocked));
    // The hand is untouched and still waiting on the same player.
    assert_eq!(room.current_state().status, TableStatus::Playing);
    assert!(room.current_state().player("a").is_some());
}
