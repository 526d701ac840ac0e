//! Async room orchestrator. A room owns one table's authoritative
//! [`PokerState`] and serializes every event through a single actor
//! task, so the pure transition layer never sees concurrent writes.

use rand::Rng;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::query::{self, PlayerView};
use crate::state::{EngineError, Event, PlayerMove, PokerState, TableStatus};
use crate::transition::{apply_event, TableRules};

/// How a room runs its table. Defaults give a 10/20 game with 1000-chip
/// stacks that deals as soon as two players are seated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Seats required before a hand is dealt automatically.
    pub min_players: usize,
    pub starting_chips: u64,
    pub small_blind: u64,
    pub big_blind: u64,
    /// Depth of the event inbox; senders back-pressure when it fills.
    pub event_queue_depth: usize,
    /// Snapshots a slow subscriber may lag behind before dropping some.
    pub broadcast_capacity: usize,
    /// Fixed shuffle seed for reproducible deals. `None` draws a fresh
    /// seed per hand.
    pub shuffle_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            starting_chips: 1000,
            small_blind: 10,
            big_blind: 20,
            event_queue_depth: 64,
            broadcast_capacity: 64,
            shuffle_seed: None,
        }
    }
}

impl RoomConfig {
    fn rules(&self) -> TableRules {
        TableRules {
            min_players: self.min_players,
            starting_chips: self.starting_chips,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
        }
    }
}

enum RoomMessage {
    Apply {
        event: Event,
        reply: oneshot::Sender<Result<PokerState, EngineError>>,
    },
}

/// Cloneable handle to a spawned room. Reads never touch the actor:
/// they borrow the latest published snapshot.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<RoomMessage>,
    state_rx: watch::Receiver<PokerState>,
    updates: broadcast::Sender<PokerState>,
}

impl RoomHandle {
    /// Submit one event and wait for the commit (or rejection). Events
    /// from all handles are applied in arrival order.
    pub async fn process_event(&self, event: Event) -> Result<PokerState, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(RoomMessage::Apply { event, reply })
            .await
            .map_err(|_| EngineError::RoomClosed)?;
        rx.await.map_err(|_| EngineError::RoomClosed)?
    }

    pub async fn join(&self, player_id: impl Into<String>) -> Result<PokerState, EngineError> {
        self.process_event(Event::join(player_id)).await
    }

    pub async fn leave(&self, player_id: impl Into<String>) -> Result<PokerState, EngineError> {
        self.process_event(Event::leave(player_id)).await
    }

    pub async fn play(
        &self,
        player_id: impl Into<String>,
        action: PlayerMove,
    ) -> Result<PokerState, EngineError> {
        self.process_event(Event::player_move(player_id, action)).await
    }

    /// Latest committed snapshot. Never blocks and never waits on the
    /// actor.
    pub fn current_state(&self) -> PokerState {
        self.state_rx.borrow().clone()
    }

    /// Redacted view of the latest snapshot for one player.
    pub fn player_view(&self, player_id: &str) -> Result<PlayerView, EngineError> {
        query::player_view(&self.state_rx.borrow(), player_id)
    }

    /// Feed of committed snapshots. A receiver that falls more than the
    /// configured capacity behind loses the oldest snapshots but never
    /// stalls the room.
    pub fn subscribe(&self) -> broadcast::Receiver<PokerState> {
        self.updates.subscribe()
    }
}

/// The actor: single owner of the table state.
pub struct Room {
    config: RoomConfig,
    state: PokerState,
    inbox: mpsc::Receiver<RoomMessage>,
    state_tx: watch::Sender<PokerState>,
    updates: broadcast::Sender<PokerState>,
    hands_dealt: u64,
}

/// Bound on system follow-up events applied after one external event,
/// so a table that instantly resolves hands cannot monopolize the
/// actor.
const MAX_FOLLOW_UPS: usize = 8;

impl Room {
    /// Spawn a room task on the current runtime and return its handle.
    /// The task exits when every handle is dropped.
    pub fn spawn(config: RoomConfig) -> RoomHandle {
        let state = PokerState::new();
        let (tx, inbox) = mpsc::channel(config.event_queue_depth.max(1));
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (updates, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let handle = RoomHandle { tx, state_rx, updates: updates.clone() };
        let room = Room { config, state, inbox, state_tx, updates, hands_dealt: 0 };
        tokio::spawn(room.run());
        handle
    }

    async fn run(mut self) {
        log::info!(
            "room open: blinds {}/{}, {} to deal",
            self.config.small_blind,
            self.config.big_blind,
            self.config.min_players
        );
        while let Some(message) = self.inbox.recv().await {
            match message {
                RoomMessage::Apply { event, reply } => {
                    let result = self.apply(&event);
                    let committed = result.is_ok();
                    let _ = reply.send(result);
                    if committed {
                        self.follow_up();
                    }
                }
            }
        }
        log::info!("room closed");
    }

    /// Apply one event against the authoritative state and, on success,
    /// commit and publish the new snapshot.
    fn apply(&mut self, event: &Event) -> Result<PokerState, EngineError> {
        let seed = if matches!(event, Event::Start) { self.next_seed() } else { 0 };
        match apply_event(&self.state, event, &self.config.rules(), seed) {
            Ok(next) => {
                if matches!(event, Event::Start) {
                    self.hands_dealt += 1;
                }
                log::debug!("event committed: {event:?}");
                self.state = next.clone();
                self.state_tx.send_replace(next.clone());
                let _ = self.updates.send(next.clone());
                Ok(next)
            }
            Err(err) => {
                log::debug!("event rejected: {event:?}: {err}");
                Err(err)
            }
        }
    }

    /// System-driven events after a commit: deal a fresh hand whenever
    /// the table is out of play and enough funded players are seated.
    fn follow_up(&mut self) {
        for _ in 0..MAX_FOLLOW_UPS {
            if !self.should_auto_start() {
                return;
            }
            if let Err(err) = self.apply(&Event::Start) {
                log::warn!("auto-start failed: {err}");
                return;
            }
        }
    }

    fn should_auto_start(&self) -> bool {
        if self.state.status == TableStatus::Playing {
            return false;
        }
        let funded = self.state.players.iter().filter(|p| p.chips > 0).count();
        self.state.players.len() >= self.config.min_players && funded >= self.config.min_players
    }

    fn next_seed(&mut self) -> u64 {
        match self.config.shuffle_seed {
            Some(base) => base.wrapping_add(self.hands_dealt),
            None => rand::rng().random(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_config() -> RoomConfig {
        RoomConfig { shuffle_seed: Some(11), ..RoomConfig::default() }
    }

    #[tokio::test]
    async fn second_join_deals_a_hand() {
        let room = Room::spawn(seeded_config());
        let state = room.join("alice").await.unwrap();
        assert_eq!(state.status, TableStatus::Waiting);
        room.join("bob").await.unwrap();
        let state = room.current_state();
        assert_eq!(state.status, TableStatus::Playing);
        assert_eq!(state.pot, 30);
        assert_eq!(state.dealer_id.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn rejected_event_leaves_state_untouched() {
        let room = Room::spawn(seeded_config());
        room.join("alice").await.unwrap();
        room.join("bob").await.unwrap();
        let before = room.current_state();
        let err = room.play("bob", PlayerMove::Call).await.unwrap_err();
        assert!(matches!(err, EngineError::NotYourTurn));
        assert_eq!(room.current_state(), before);
    }

    #[tokio::test]
    async fn join_mid_hand_is_locked_out() {
        let room = Room::spawn(seeded_config());
        room.join("alice").await.unwrap();
        room.join("bob").await.unwrap();
        let err = room.join("carol").await.unwrap_err();
        assert!(matches!(err, EngineError::TableLocked));
    }

    #[tokio::test]
    async fn subscribers_see_each_commit() {
        let room = Room::spawn(seeded_config());
        let mut feed = room.subscribe();
        room.join("alice").await.unwrap();
        let snap = feed.recv().await.unwrap();
        assert_eq!(snap.players.len(), 1);
        room.join("bob").await.unwrap();
        let snap = feed.recv().await.unwrap();
        assert_eq!(snap.players.len(), 2);
        // The auto-start commit arrives as its own snapshot.
        let snap = feed.recv().await.unwrap();
        assert_eq!(snap.status, TableStatus::Playing);
    }

    #[tokio::test]
    async fn player_view_redacts_opponents() {
        let room = Room::spawn(seeded_config());
        room.join("alice").await.unwrap();
        room.join("bob").await.unwrap();
        let view = room.player_view("alice").unwrap();
        assert!(view.me.hole.is_some());
        assert!(view.opponents.iter().all(|o| o.id == "bob"));
        let err = room.player_view("ghost").unwrap_err();
        assert!(matches!(err, EngineError::UnknownPlayer(_)));
    }

    #[tokio::test]
    async fn fold_out_restarts_with_rotated_button() {
        let room = Room::spawn(seeded_config());
        room.join("alice").await.unwrap();
        room.join("bob").await.unwrap();
        // Dealer alice acts first heads-up preflop; folding ends the
        // hand, and the room deals the next one on its own.
        room.play("alice", PlayerMove::Fold).await.unwrap();
        let state = room.current_state();
        assert_eq!(state.status, TableStatus::Playing);
        assert_eq!(state.dealer_id.as_deref(), Some("bob"));
        assert_eq!(state.pot, 30);
    }
}
