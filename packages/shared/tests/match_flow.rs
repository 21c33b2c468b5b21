use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::games::chess::ChessMove;
use shared::games::connect4::Connect4Move;
use shared::games::domino::{DominoMove, DominoState};
use shared::games::tictactoe::TicTacToeMove;
use shared::games::{Exhaustion, GameMove, GameState, MoveError};
use shared::models::game_room::{GameRoom, RoomStatus};
use shared::models::game_type::GameType;
use shared::random::SharedRng;
use shared::repositories::errors::room_repository_errors::RoomRepositoryError;
use shared::repositories::room_repository::{InMemoryRoomRepository, RoomRepository};
use shared::repositories::stats_repository::InMemoryStatsRepository;
use shared::repositories::user_repository::InMemoryUserRepository;
use shared::services::errors::match_service_errors::MatchServiceError;
use shared::services::errors::room_service_errors::RoomServiceError;
use shared::services::match_service::{MatchService, MatchSettings};
use shared::services::room_service::RoomService;
use shared::services::stats_service::StatsService;
use shared::sync::{RoomPoller, RoomSource, SyncEvent};
use tokio::sync::mpsc;

fn build(seed: u64) -> (Arc<MatchService>, Arc<StatsService>) {
    let stats = Arc::new(StatsService::new(Arc::new(InMemoryStatsRepository::new())));
    let matches = instance(Arc::new(InMemoryRoomRepository::new()), stats.clone(), seed);
    (matches, stats)
}

/// One server instance: its own lock registry, sharing only the store.
fn instance(
    repository: Arc<dyn RoomRepository + Send + Sync>,
    stats: Arc<StatsService>,
    seed: u64,
) -> Arc<MatchService> {
    let rng = SharedRng::new(Some(seed));
    let rooms = Arc::new(RoomService::new(
        repository,
        Arc::new(InMemoryUserRepository::new()),
        stats,
        rng.clone(),
    ));
    Arc::new(MatchService::new(rooms, rng, MatchSettings::default()))
}

/// Store whose reads return a little before the caller gets to write, so two
/// instances reliably interleave between read and write.
struct SlowReads(InMemoryRoomRepository);

#[async_trait]
impl RoomRepository for SlowReads {
    async fn create_room(&self, room: &GameRoom) -> Result<(), RoomRepositoryError> {
        self.0.create_room(room).await
    }

    async fn get_room(&self, room_id: &str) -> Result<Option<GameRoom>, RoomRepositoryError> {
        let room = self.0.get_room(room_id).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        room
    }

    async fn get_active_room_by_code(
        &self,
        room_code: &str,
    ) -> Result<Option<GameRoom>, RoomRepositoryError> {
        self.0.get_active_room_by_code(room_code).await
    }

    async fn update_room(
        &self,
        room: &GameRoom,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError> {
        self.0.update_room(room, expected_version).await
    }

    async fn delete_room(
        &self,
        room_id: &str,
        expected_version: u64,
    ) -> Result<(), RoomRepositoryError> {
        self.0.delete_room(room_id, expected_version).await
    }

    async fn list_active_rooms(
        &self,
        game_type: Option<GameType>,
    ) -> Result<Vec<GameRoom>, RoomRepositoryError> {
        self.0.list_active_rooms(game_type).await
    }
}

async fn start(matches: &MatchService, game_type: GameType) -> anyhow::Result<GameRoom> {
    let room = matches.rooms().create(game_type, "alice").await?;
    Ok(matches.join_by_code(&room.room_code, "bob").await?)
}

fn chess(from: &str, to: &str) -> GameMove {
    GameMove::Chess(ChessMove {
        from: from.to_string(),
        to: to.to_string(),
        promotion: None,
    })
}

#[tokio::test]
async fn fools_mate_finishes_the_room_for_black() -> anyhow::Result<()> {
    let (matches, stats) = build(1);
    let room = start(&matches, GameType::Chess).await?;

    for (user, from, to) in [
        ("alice", "f2", "f3"),
        ("bob", "e7", "e5"),
        ("alice", "g2", "g4"),
    ] {
        let out = matches.submit_move(&room.id, user, &chess(from, to)).await?;
        assert!(out.outcome.is_none());
    }
    let out = matches.submit_move(&room.id, "bob", &chess("d8", "h4")).await?;

    assert_eq!(out.room.status, RoomStatus::Finished);
    assert_eq!(out.room.winner_id.as_deref(), Some("bob"));
    let GameState::Chess(state) = serde_json::from_value::<GameState>(out.room.game_state)? else {
        panic!("chess room holds chess state");
    };
    assert_eq!(state.pgn, vec!["f3", "e5", "g4", "Qh4#"]);
    assert_eq!(stats.get_user_stats("bob").await?[0].wins, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_moves_on_one_room_apply_exactly_once() -> anyhow::Result<()> {
    let (matches, _) = build(2);
    let room = start(&matches, GameType::Connect4).await?;

    let attempts: Vec<_> = (0..8)
        .map(|column| {
            let matches = matches.clone();
            let room_id = room.id.clone();
            tokio::spawn(async move {
                matches
                    .submit_move(&room_id, "alice", &GameMove::Connect4(Connect4Move { column }))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for attempt in attempts {
        match attempt.await? {
            Ok(_) => accepted += 1,
            Err(MatchServiceError::RoomError(RoomServiceError::NotYourTurn)) => {}
            Err(MatchServiceError::MoveRejected(MoveError::Validation(_))) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(accepted, 1);
    let stored = matches.rooms().get(&room.id).await?;
    assert_eq!(stored.current_turn, "bob");
    Ok(())
}

#[tokio::test]
async fn domino_exhaustion_offers_the_alternative() -> anyhow::Result<()> {
    let (matches, _) = build(3);
    let room = start(&matches, GameType::Domino).await?;

    let GameState::Domino(state) = serde_json::from_value::<GameState>(room.game_state.clone())? else {
        panic!("domino room holds domino state");
    };
    // Nothing is on the board yet, so drawing is never forced on the first turn.
    let draw = matches.submit_move(&room.id, "alice", &GameMove::Domino(DominoMove::Draw)).await;
    assert!(matches!(
        draw,
        Err(MatchServiceError::MoveRejected(MoveError::Validation(_)))
    ));

    let tile = state.hands[0][0];
    let played = matches
        .submit_move(
            &room.id,
            "alice",
            &GameMove::Domino(DominoMove::Play {
                tile,
                side: shared::games::domino::Side::Left,
            }),
        )
        .await?;
    assert_eq!(played.room.current_turn, "bob");

    let after: DominoState = match serde_json::from_value::<GameState>(played.room.game_state)? {
        GameState::Domino(s) => s,
        _ => panic!("domino room holds domino state"),
    };
    assert_eq!(after.board.len(), 1);
    assert_eq!(after.hands[0].len(), 6);

    let exhausted = MoveError::Exhaustion(Exhaustion::MustDraw);
    assert_eq!(exhausted.to_string(), "no playable tile, you must draw");
    Ok(())
}

#[tokio::test]
async fn outsiders_cannot_move_or_leave() -> anyhow::Result<()> {
    let (matches, _) = build(4);
    let room = start(&matches, GameType::Connect4).await?;

    let moved = matches
        .submit_move(&room.id, "mallory", &GameMove::Connect4(Connect4Move { column: 0 }))
        .await;
    let left = matches.leave(&room.id, "mallory").await;

    assert!(matches!(
        moved,
        Err(MatchServiceError::RoomError(RoomServiceError::NotParticipant))
    ));
    assert!(matches!(
        left,
        Err(MatchServiceError::RoomError(RoomServiceError::NotParticipant))
    ));
    assert_eq!(matches.rooms().get(&room.id).await?, room);
    Ok(())
}

#[tokio::test]
async fn two_instances_cannot_both_apply_a_move_for_the_same_turn() -> anyhow::Result<()> {
    let store: Arc<dyn RoomRepository + Send + Sync> =
        Arc::new(SlowReads(InMemoryRoomRepository::new()));
    let stats = Arc::new(StatsService::new(Arc::new(InMemoryStatsRepository::new())));
    let first = instance(store.clone(), stats.clone(), 5);
    let second = instance(store.clone(), stats, 6);
    let room = start(&first, GameType::TicTacToe).await?;

    let corner = |row, col| GameMove::TicTacToe(TicTacToeMove { row, col });
    let (move_a, move_b) = (corner(0, 0), corner(2, 2));
    let (a, b) = tokio::join!(
        first.submit_move(&room.id, "alice", &move_a),
        second.submit_move(&room.id, "alice", &move_b),
    );

    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    let loser = if outcomes[0] { b } else { a };
    assert!(matches!(
        loser,
        Err(MatchServiceError::RoomError(RoomServiceError::StateConflict(_)))
    ));

    let stored = store.get_room(&room.id).await?.expect("room still exists");
    let GameState::TicTacToe(state) = serde_json::from_value::<GameState>(stored.game_state)? else {
        panic!("tic-tac-toe room holds tic-tac-toe state");
    };
    let placed = state.board.iter().flatten().filter(|cell| cell.is_some()).count();
    assert_eq!(placed, 1);
    assert_eq!(stored.current_turn, "bob");
    Ok(())
}

/// Waits for the next event, failing the test instead of hanging.
async fn next_event(rx: &mut mpsc::Receiver<SyncEvent>) -> Option<SyncEvent> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("poller went quiet")
}

#[tokio::test]
async fn poller_over_room_service_follows_a_game_to_the_end() -> anyhow::Result<()> {
    let (matches, _) = build(7);
    let room = matches.rooms().create(GameType::TicTacToe, "alice").await?;
    let source: Arc<dyn RoomSource> = matches.rooms().clone();
    let (handle, mut rx) = RoomPoller::spawn(source, &room.id, Duration::from_millis(10));

    let Some(SyncEvent::Snapshot { room: first }) = next_event(&mut rx).await else {
        panic!("first event is the snapshot");
    };
    assert_eq!(first.status, RoomStatus::Waiting);

    matches.join_by_code(&room.room_code, "bob").await?;
    let mut joined = Vec::new();
    while !joined.iter().any(|e| matches!(e, SyncEvent::Joined { .. })) {
        joined.push(next_event(&mut rx).await.expect("poller stopped before the join"));
    }
    assert!(joined.contains(&SyncEvent::Joined {
        player2_id: "bob".to_string()
    }));

    for (user, row, col) in [
        ("alice", 0, 0),
        ("bob", 1, 0),
        ("alice", 0, 1),
        ("bob", 1, 1),
        ("alice", 0, 2),
    ] {
        matches
            .submit_move(&room.id, user, &GameMove::TicTacToe(TicTacToeMove { row, col }))
            .await?;
    }

    let mut rest = Vec::new();
    while let Some(event) = next_event(&mut rx).await {
        rest.push(event);
    }
    assert!(rest.iter().any(|e| matches!(e, SyncEvent::StateChanged { .. })));
    assert_eq!(
        rest.last(),
        Some(&SyncEvent::Finished {
            winner_id: Some("alice".to_string()),
            is_draw: false
        })
    );
    drop(handle);
    Ok(())
}

#[tokio::test]
async fn poller_over_room_service_reports_a_deleted_room() -> anyhow::Result<()> {
    let (matches, _) = build(8);
    let room = matches.rooms().create(GameType::Connect4, "alice").await?;
    let source: Arc<dyn RoomSource> = matches.rooms().clone();

    assert!(source.fetch_room("no-such-room").await?.is_none());

    let (_handle, mut rx) = RoomPoller::spawn(source, &room.id, Duration::from_millis(10));
    assert!(matches!(next_event(&mut rx).await, Some(SyncEvent::Snapshot { .. })));

    matches.leave(&room.id, "alice").await?;

    assert_eq!(next_event(&mut rx).await, Some(SyncEvent::Removed));
    assert_eq!(next_event(&mut rx).await, None);
    Ok(())
}
