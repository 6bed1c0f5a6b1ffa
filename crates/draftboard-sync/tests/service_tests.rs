// Integration tests for the draft service.
//
// These drive full drafts through the public API: lobby claims,
// randomization, the pick loop, pause/resume, reset, CSV import, and the
// conditional-write race at the store. Everything runs against an
// in-memory SQLite store with a broadcast notifier.

use std::sync::Arc;

use chrono::Utc;

use draftboard_core::auth::AuthPolicy;
use draftboard_core::error::DraftError;
use draftboard_core::import::ImportSummary;
use draftboard_core::player::{FieldStats, Player, PlayerStats};
use draftboard_core::state::{DraftSettings, DraftState, DraftStatus, ResetConfig};
use draftboard_sync::events::{BroadcastNotifier, DraftEvent};
use draftboard_sync::service::{DraftService, ServiceError};
use draftboard_sync::store::{DraftStore, SqliteStore, StoreError};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Route log output through the test harness; `RUST_LOG` controls the
/// filter. Safe to call from every test, first call wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sample_player(id: &str) -> Player {
    Player {
        id: id.to_string(),
        name: format!("Player {id}"),
        position: "ST".to_string(),
        club: "Test FC".to_string(),
        overall: 80,
        height: None,
        weight: None,
        skill_moves: None,
        stats: PlayerStats::Field(FieldStats {
            pace: 78,
            shooting: 80,
            passing: 72,
            dribbling: 76,
            defense: 42,
            physical: 70,
        }),
    }
}

fn pool(count: usize) -> Vec<Player> {
    (1..=count).map(|i| sample_player(&format!("p{i}"))).collect()
}

fn settings(teams: u32, rounds: u32) -> DraftSettings {
    DraftSettings {
        number_of_teams: teams,
        number_of_rounds: rounds,
        seconds_per_pick: 90,
        snake_format: true,
    }
}

type TestService = DraftService<SqliteStore, BroadcastNotifier>;

fn fresh_service(teams: u32, rounds: u32, players: usize) -> TestService {
    init_tracing();
    let state = DraftState::new(settings(teams, rounds), pool(players));
    DraftService::new(
        state,
        SqliteStore::open(":memory:").unwrap(),
        BroadcastNotifier::new(64),
        AuthPolicy::default(),
    )
    .unwrap()
}

/// Claim every team and randomize, leaving the draft ready to start.
async fn fill_lobby(service: &TestService, teams: u32) {
    for i in 1..=teams {
        service
            .claim_team(&format!("user{i}"), &format!("t{i}"))
            .await
            .unwrap();
    }
    service.randomize_order().await.unwrap();
}

/// The participant whose team is on the clock right now.
async fn current_participant(service: &TestService) -> String {
    let snapshot = service.snapshot().await;
    snapshot
        .on_the_clock()
        .and_then(|t| t.assignee.clone())
        .expect("a claimed team should be on the clock")
}

// ===========================================================================
// Lobby
// ===========================================================================

#[tokio::test]
async fn claiming_a_taken_team_is_rejected() {
    let service = fresh_service(4, 2, 8);
    service.claim_team("alice", "t1").await.unwrap();

    let err = service.claim_team("bob", "t1").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Draft(DraftError::TeamAlreadyClaimed { .. })
    ));

    // Release opens it up again.
    assert!(service.release_team("alice").await.unwrap());
    service.claim_team("bob", "t1").await.unwrap();
}

#[tokio::test]
async fn randomize_assigns_contiguous_positions_to_claimed_teams() {
    let service = fresh_service(5, 2, 10);
    service.claim_team("alice", "t2").await.unwrap();
    service.claim_team("bob", "t4").await.unwrap();

    let teams = service.randomize_order().await.unwrap();
    let mut positions: Vec<u32> = teams.iter().filter_map(|t| t.draft_position).collect();
    positions.sort_unstable();
    assert_eq!(positions, [1, 2]);
    assert!(teams
        .iter()
        .filter(|t| !t.is_claimed())
        .all(|t| t.draft_position.is_none()));
}

#[tokio::test]
async fn randomize_after_start_is_rejected() {
    let service = fresh_service(3, 1, 6);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    let err = service.randomize_order().await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Draft(DraftError::InvalidTransition { .. })
    ));
}

// ===========================================================================
// The pick loop
// ===========================================================================

#[tokio::test]
async fn full_draft_runs_to_completion() {
    let service = fresh_service(3, 2, 10);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    for i in 1..=6 {
        let participant = current_participant(&service).await;
        service
            .apply_pick(&participant, &format!("p{i}"))
            .await
            .unwrap();
    }

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.status, DraftStatus::Completed);
    assert_eq!(snapshot.cursor, 6);
    assert_eq!(snapshot.available_players.len(), 4);
    assert!(snapshot.teams.iter().all(|t| t.roster.len() == 2));
    assert!(snapshot.picks.iter().all(|p| p.is_filled()));
}

#[tokio::test]
async fn out_of_turn_pick_is_rejected() {
    let service = fresh_service(3, 2, 6);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    let on_clock = current_participant(&service).await;
    let someone_else = (1..=3)
        .map(|i| format!("user{i}"))
        .find(|u| *u != on_clock)
        .unwrap();

    let err = service.apply_pick(&someone_else, "p1").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Draft(DraftError::NotYourTurn { .. })
    ));

    // Nothing moved.
    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.cursor, 0);
    assert_eq!(snapshot.available_players.len(), 6);
}

#[tokio::test]
async fn admin_can_pick_on_any_turn() {
    init_tracing();
    let state = DraftState::new(settings(3, 1), pool(6));
    let service = DraftService::new(
        state,
        SqliteStore::open(":memory:").unwrap(),
        BroadcastNotifier::new(64),
        AuthPolicy {
            admin: Some("commissioner".to_string()),
        },
    )
    .unwrap();
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    service.apply_pick("commissioner", "p1").await.unwrap();
    assert_eq!(service.snapshot().await.cursor, 1);
}

#[tokio::test]
async fn picking_a_drafted_player_is_rejected() {
    let service = fresh_service(3, 2, 6);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    let participant = current_participant(&service).await;
    service.apply_pick(&participant, "p1").await.unwrap();

    let participant = current_participant(&service).await;
    let err = service.apply_pick(&participant, "p1").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Draft(DraftError::PlayerUnavailable { .. })
    ));
}

#[tokio::test]
async fn state_survives_a_restart_mid_draft() {
    init_tracing();
    let db_path = std::env::temp_dir().join(format!(
        "draftboard-restart-{}.db",
        std::process::id()
    ));
    let db_path = db_path.to_str().unwrap().to_string();
    let _ = std::fs::remove_file(&db_path);

    {
        let state = DraftState::new(settings(3, 2), pool(6));
        let service = DraftService::new(
            state,
            SqliteStore::open(&db_path).unwrap(),
            BroadcastNotifier::new(64),
            AuthPolicy::default(),
        )
        .unwrap();
        fill_lobby(&service, 3).await;
        service.start_draft().await.unwrap();
        let participant = current_participant(&service).await;
        service.apply_pick(&participant, "p1").await.unwrap();
    }

    // A new process resumes from the store, not from `initial`.
    let service = DraftService::load_or_init(
        SqliteStore::open(&db_path).unwrap(),
        BroadcastNotifier::new(64),
        AuthPolicy::default(),
        DraftState::new(settings(3, 2), pool(6)),
    )
    .unwrap();

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.status, DraftStatus::InProgress);
    assert_eq!(snapshot.cursor, 1);
    assert!(snapshot.picks[0].is_filled());
    let rostered: usize = snapshot.teams.iter().map(|t| t.roster.len()).sum();
    assert_eq!(rostered, 1);

    // The restarted process is not stuck on the already-filled slot; the
    // next pick goes through.
    let participant = current_participant(&service).await;
    service.apply_pick(&participant, "p2").await.unwrap();
    assert_eq!(service.snapshot().await.cursor, 2);

    let _ = std::fs::remove_file(&db_path);
}

// ===========================================================================
// The race: two writers, one slot
// ===========================================================================

#[tokio::test]
async fn conditional_write_lets_exactly_one_writer_win() {
    init_tracing();
    // Two services over the same database model two processes that both
    // believe it is their pick. The store's conditional write decides.
    let db_path = std::env::temp_dir().join(format!(
        "draftboard-race-{}.db",
        std::process::id()
    ));
    let db_path = db_path.to_str().unwrap().to_string();
    let _ = std::fs::remove_file(&db_path);

    let state = DraftState::new(settings(3, 2), pool(6));
    let first = DraftService::new(
        state,
        SqliteStore::open(&db_path).unwrap(),
        BroadcastNotifier::new(64),
        AuthPolicy::default(),
    )
    .unwrap();
    fill_lobby(&first, 3).await;
    first.start_draft().await.unwrap();

    let second = DraftService::load_or_init(
        SqliteStore::open(&db_path).unwrap(),
        BroadcastNotifier::new(64),
        AuthPolicy::default(),
        DraftState::new(settings(3, 2), pool(6)),
    )
    .unwrap();

    let participant = current_participant(&first).await;
    first.apply_pick(&participant, "p1").await.unwrap();

    // The stale process tries the same slot with a different player.
    let err = second.apply_pick(&participant, "p2").await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { overall: 1 }));

    // The loser's aggregate rolled back; cursor still where it was.
    assert_eq!(second.snapshot().await.cursor, 0);

    // The database holds the winner's pick.
    let store = SqliteStore::open(&db_path).unwrap();
    let persisted = store.load_snapshot().unwrap().unwrap();
    assert_eq!(persisted.picks[0].player.as_ref().unwrap().id, "p1");

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn store_level_conflict_is_distinct() {
    init_tracing();
    let store = SqliteStore::open(":memory:").unwrap();
    let mut state = DraftState::new(settings(2, 1), pool(4));
    for i in 1..=2 {
        draftboard_core::team::claim_team(
            &mut state.teams,
            &format!("user{i}"),
            &format!("t{i}"),
        )
        .unwrap();
    }
    for (i, team) in state.teams.iter_mut().enumerate() {
        team.draft_position = Some(i as u32 + 1);
    }
    state.start(Utc::now()).unwrap();
    store.save_snapshot(&state).unwrap();

    let mut winner = state.clone();
    let applied = winner.apply_pick("p1", Utc::now()).unwrap();
    store.fill_pick(&winner, &applied).unwrap();

    let mut loser = state.clone();
    let stale = loser.apply_pick("p2", Utc::now()).unwrap();
    let err = store.fill_pick(&loser, &stale).unwrap_err();
    assert!(matches!(err, StoreError::Conflict { overall: 1 }));
}

// ===========================================================================
// Pause, resume, reset
// ===========================================================================

#[tokio::test]
async fn picks_are_blocked_while_paused() {
    let service = fresh_service(3, 2, 6);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();
    service.pause_draft().await.unwrap();

    let participant = current_participant(&service).await;
    let err = service.apply_pick(&participant, "p1").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Draft(DraftError::NotInProgress { .. })
    ));

    service.resume_draft().await.unwrap();
    service.apply_pick(&participant, "p1").await.unwrap();
}

#[tokio::test]
async fn reset_returns_to_lobby_and_persists() {
    let service = fresh_service(3, 2, 6);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();
    let participant = current_participant(&service).await;
    service.apply_pick(&participant, "p1").await.unwrap();

    service.reset_draft(None).await.unwrap();

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.status, DraftStatus::NotStarted);
    assert_eq!(snapshot.available_players.len(), 6);
    assert!(snapshot.teams.iter().all(|t| t.is_claimed()));

    // A reset draft can run again end to end.
    service.randomize_order().await.unwrap();
    service.start_draft().await.unwrap();
    let participant = current_participant(&service).await;
    service.apply_pick(&participant, "p3").await.unwrap();
    assert_eq!(service.snapshot().await.cursor, 1);
}

#[tokio::test]
async fn reset_with_resize_drops_claims() {
    let service = fresh_service(3, 2, 6);
    fill_lobby(&service, 3).await;

    service
        .reset_draft(Some(ResetConfig {
            number_of_teams: Some(5),
            ..Default::default()
        }))
        .await
        .unwrap();

    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.teams.len(), 5);
    assert!(snapshot.teams.iter().all(|t| !t.is_claimed()));
}

// ===========================================================================
// Import
// ===========================================================================

#[tokio::test]
async fn csv_import_replaces_the_pool() {
    let service = fresh_service(3, 2, 6);
    let csv = "id,name,position,club,overall,pace,shooting,passing,dribbling,defense,physical\n\
               n1,New One,ST,Club A,82,80,81,70,75,40,72\n\
               n2,New Two,CB,Club B,79,65,40,60,55,82,80\n";
    let (players, summary) = draftboard_sync::csv_import::read_players(csv.as_bytes()).unwrap();
    assert_eq!(summary, ImportSummary { imported: 2, skipped: 0 });

    service.replace_players(players, summary).await.unwrap();
    let snapshot = service.snapshot().await;
    assert_eq!(snapshot.available_players.len(), 2);
    assert_eq!(snapshot.available_players[0].id, "n1");
}

#[tokio::test]
async fn import_after_start_is_rejected() {
    let service = fresh_service(3, 1, 6);
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    let (players, summary) = draftboard_sync::csv_import::read_players(
        "id,name,position,club,overall,pace,shooting,passing,dribbling,defense,physical\n\
         n1,New One,ST,Club A,82,80,81,70,75,40,72\n"
            .as_bytes(),
    )
    .unwrap();
    let err = service.replace_players(players, summary).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Draft(DraftError::InvalidTransition { .. })
    ));
}

// ===========================================================================
// Events
// ===========================================================================

#[tokio::test]
async fn lifecycle_events_reach_subscribers() {
    init_tracing();
    let notifier = BroadcastNotifier::new(64);
    let mut rx = notifier.subscribe();
    let state = DraftState::new(settings(3, 1), pool(6));
    let service = Arc::new(
        DraftService::new(
            state,
            SqliteStore::open(":memory:").unwrap(),
            notifier,
            AuthPolicy::default(),
        )
        .unwrap(),
    );

    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();
    let participant = current_participant(&service).await;
    service.apply_pick(&participant, "p1").await.unwrap();

    // Claims, then the randomize, start, and pick events, in issue order
    // (single writer, single subscriber).
    for _ in 0..3 {
        assert!(matches!(
            rx.recv().await.unwrap(),
            DraftEvent::TeamClaimed { .. }
        ));
    }
    assert!(matches!(
        rx.recv().await.unwrap(),
        DraftEvent::OrderRandomized { .. }
    ));
    match rx.recv().await.unwrap() {
        DraftEvent::DraftStarted { snapshot } => {
            assert_eq!(snapshot.status, DraftStatus::InProgress);
        }
        other => panic!("expected DraftStarted, got {other:?}"),
    }
    match rx.recv().await.unwrap() {
        DraftEvent::PickApplied { pick } => {
            assert_eq!(pick.overall, 1);
            assert_eq!(pick.player_id, "p1");
        }
        other => panic!("expected PickApplied, got {other:?}"),
    }
}

#[tokio::test]
async fn countdown_expiry_notifies_without_advancing() {
    init_tracing();
    let state = DraftState::new(
        DraftSettings {
            seconds_per_pick: 1,
            ..settings(3, 1)
        },
        pool(6),
    );
    let notifier = BroadcastNotifier::new(64);
    let mut rx = notifier.subscribe();
    let service = DraftService::new(
        state,
        SqliteStore::open(":memory:").unwrap(),
        notifier,
        AuthPolicy::default(),
    )
    .unwrap();
    fill_lobby(&service, 3).await;
    service.start_draft().await.unwrap();

    // Not expired yet.
    assert!(!service.check_time_expired().await.unwrap());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    assert!(service.check_time_expired().await.unwrap());
    // Repeated polls still report expiry but do not re-broadcast it.
    assert!(service.check_time_expired().await.unwrap());
    assert!(service.check_time_expired().await.unwrap());

    // Exactly one expiry event for this pick, and the cursor never moved.
    let mut expired_events = 0;
    while let Ok(event) = rx.try_recv() {
        if let DraftEvent::TimeExpired { overall, .. } = event {
            assert_eq!(overall, 1);
            expired_events += 1;
        }
    }
    assert_eq!(expired_events, 1);
    assert_eq!(service.snapshot().await.cursor, 0);
    assert_eq!(service.snapshot().await.status, DraftStatus::InProgress);
}
