use std::sync::Arc;
use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Duration};
use common::{
    DeathCause, Direction, EngineTiming, PlayerSlot, RoundCommand, RoundEvent, RoundState,
    RoundStatus, Winner,
};
use session::replication::{read_game_state, read_snake, PixelPoint};
use session::{
    spawn_autopilot, spawn_session, LocalReplica, ParticipantId, SessionConfig, SessionHandle,
};

fn seeded_config(seed: u64) -> SessionConfig {
    SessionConfig { seed: Some(seed), ..SessionConfig::default() }
}

async fn wait_for_state(
    state_rx: &mut watch::Receiver<RoundState>,
    predicate: impl FnMut(&RoundState) -> bool,
) -> Result<RoundState> {
    let state = timeout(Duration::from_secs(60), state_rx.wait_for(predicate))
        .await
        .context("Timed out waiting for round state")??;
    Ok(state.clone())
}

async fn start_with_two_players(
    config: &SessionConfig,
) -> Result<(SessionHandle, Arc<LocalReplica>, ParticipantId, ParticipantId)> {
    let replica = Arc::new(LocalReplica::new());
    let session = spawn_session(config, replica.clone());
    let host = ParticipantId::new();
    let guest = ParticipantId::new();
    session.client().join(host).await?;
    session.client().join(guest).await?;
    Ok((session, replica, host, guest))
}

#[tokio::test(start_paused = true)]
async fn test_round_plays_out_to_a_winner() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let (session, replica, host, guest) = start_with_two_players(&seeded_config(1)).await?;
    let client = session.client();
    let mut events = session.subscribe_events();
    let mut state_rx = session.watch_state();

    // Only the host can start
    client.command(guest, RoundCommand::Start).await?;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(state_rx.borrow().status, RoundStatus::NotStarted);

    client.command(host, RoundCommand::Start).await?;
    wait_for_state(&mut state_rx, |s| matches!(s.status, RoundStatus::Countdown { .. })).await?;

    let record = read_game_state(replica.as_ref()).await?.context("no game state record")?;
    assert!(record.is_started);
    assert_eq!(record.countdown, 3);

    // Player 1 heads straight for the top wall
    client.command(host, RoundCommand::Turn { direction: Direction::Up }).await?;

    let over = wait_for_state(&mut state_rx, |s| s.is_over()).await?;
    assert_eq!(over.winner, Some(Winner::Player2));
    assert_eq!(over.tick, 11);

    let record = read_game_state(replica.as_ref()).await?.context("no game state record")?;
    assert!(record.game_over);
    assert_eq!(record.winner, Some(Winner::Player2));

    let snake1 = read_snake(replica.as_ref(), PlayerSlot::Player1)
        .await?
        .context("no snake1 record")?;
    assert!(!snake1.alive);
    assert_eq!(snake1.body[0], PixelPoint { x: 60, y: 0 });

    let mut seen = Vec::new();
    while let Ok(message) = events.try_recv() {
        seen.push(message.event);
    }
    assert_eq!(seen.first(), Some(&RoundEvent::RoundStarted));
    assert!(seen.contains(&RoundEvent::RoundRunning));
    assert!(seen.contains(&RoundEvent::SnakeDied {
        player: PlayerSlot::Player1,
        cause: DeathCause::Wall,
    }));
    assert_eq!(seen.last(), Some(&RoundEvent::RoundOver { winner: Winner::Player2 }));

    let final_state = session.shutdown().await?;
    assert!(final_state.is_over());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_late_wakeup_keeps_per_step_ticks() -> Result<()> {
    let (session, _replica, host, _guest) = start_with_two_players(&seeded_config(5)).await?;
    let client = session.client();
    let mut events = session.subscribe_events();
    let mut state_rx = session.watch_state();

    client.command(host, RoundCommand::Start).await?;
    client.command(host, RoundCommand::Turn { direction: Direction::Up }).await?;
    wait_for_state(&mut state_rx, |s| s.snake(PlayerSlot::Player1).direction == Direction::Up)
        .await?;

    // Countdown and every tick up to the crash all come due in one wakeup
    tokio::time::advance(Duration::from_secs(10)).await;
    let over = wait_for_state(&mut state_rx, |s| s.is_over()).await?;
    assert_eq!(over.tick, 11);

    let mut seen = Vec::new();
    while let Ok(message) = events.try_recv() {
        seen.push(message);
    }
    let tick_of = |wanted: &RoundEvent| {
        seen.iter().find(|message| &message.event == wanted).map(|message| message.tick)
    };
    assert_eq!(tick_of(&RoundEvent::CountdownStepped { remaining: 2 }), Some(0));
    assert_eq!(tick_of(&RoundEvent::RoundRunning), Some(0));
    assert_eq!(tick_of(&RoundEvent::RoundOver { winner: Winner::Player2 }), Some(11));
    assert!(seen.windows(2).all(|pair| pair[0].tick <= pair[1].tick));

    session.shutdown().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_pause_freezes_the_round() -> Result<()> {
    let (session, _replica, host, guest) = start_with_two_players(&seeded_config(2)).await?;
    let client = session.client();
    let mut state_rx = session.watch_state();

    client.command(host, RoundCommand::Start).await?;
    wait_for_state(&mut state_rx, |s| s.status == RoundStatus::Running).await?;
    wait_for_state(&mut state_rx, |s| s.tick >= 2).await?;

    client.command(guest, RoundCommand::Pause).await?;
    sleep(Duration::from_millis(10)).await;
    assert_ne!(state_rx.borrow().status, RoundStatus::Paused, "guest must not be able to pause");

    client.command(host, RoundCommand::Pause).await?;
    let paused = wait_for_state(&mut state_rx, |s| s.status == RoundStatus::Paused).await?;

    sleep(Duration::from_secs(5)).await;
    assert_eq!(*state_rx.borrow(), paused);

    // Pausing twice changes nothing
    client.command(host, RoundCommand::Pause).await?;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(*state_rx.borrow(), paused);

    client.command(host, RoundCommand::Resume).await?;
    let resumed = wait_for_state(&mut state_rx, |s| s.tick > paused.tick).await?;
    assert_eq!(resumed.tick, paused.tick + 1);
    assert_eq!(resumed.status, RoundStatus::Running);

    session.shutdown().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_host_role_passes_on_when_host_leaves() -> Result<()> {
    let (session, _replica, host, guest) = start_with_two_players(&seeded_config(3)).await?;
    let client = session.client();
    let mut state_rx = session.watch_state();

    let spectator = ParticipantId::new();
    client.join(spectator).await?;
    client.command(spectator, RoundCommand::Start).await?;
    client.command(ParticipantId::new(), RoundCommand::Start).await?;
    sleep(Duration::from_millis(10)).await;
    assert_eq!(state_rx.borrow().status, RoundStatus::NotStarted);

    client.leave(host).await?;
    client.command(guest, RoundCommand::Start).await?;
    wait_for_state(&mut state_rx, |s| matches!(s.status, RoundStatus::Countdown { .. })).await?;

    // The former guest now steers snake 1, the spectator snake 2
    client.command(spectator, RoundCommand::Turn { direction: Direction::Down }).await?;
    let turned = wait_for_state(&mut state_rx, |s| {
        s.snake(PlayerSlot::Player2).direction == Direction::Down
    })
    .await?;
    assert_eq!(turned.snake(PlayerSlot::Player1).direction, Direction::Right);

    client.command(guest, RoundCommand::Reset).await?;
    wait_for_state(&mut state_rx, |s| s.status == RoundStatus::NotStarted).await?;

    session.shutdown().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_autopilots_play_a_round() -> Result<()> {
    let config = SessionConfig {
        seed: Some(4),
        timing: EngineTiming { tick_ms: 20, countdown_step_ms: 100 },
        ..SessionConfig::default()
    };
    let (session, _replica, host, guest) = start_with_two_players(&config).await?;
    let client = session.client();
    let mut events = session.subscribe_events();
    let mut state_rx = session.watch_state();

    let autopilots = [
        spawn_autopilot(client.clone(), host, PlayerSlot::Player1, session.watch_state()),
        spawn_autopilot(client.clone(), guest, PlayerSlot::Player2, session.watch_state()),
    ];

    client.command(host, RoundCommand::Start).await?;
    let state = wait_for_state(&mut state_rx, |s| s.is_over() || s.tick >= 200).await?;

    let mut turned = false;
    while let Ok(message) = events.try_recv() {
        turned |= matches!(message.event, RoundEvent::SnakeTurned { .. });
    }

    if state.is_over() {
        assert!(state.winner.is_some());
    } else {
        assert!(turned, "autopilots should have steered within 200 ticks");
        assert!(state.snakes.iter().all(|snake| snake.is_alive));
    }

    session.shutdown().await?;
    for autopilot in autopilots {
        autopilot.await?;
    }
    Ok(())
}
