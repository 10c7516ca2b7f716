use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;
use common::{FoodPlacement, PlayerSlot, RoundCommand, RoundState, Winner};
use session::replication::read_game_state;
use session::{spawn_autopilot, spawn_session, LocalReplica, ParticipantId, SessionConfig};

#[derive(Parser, Debug)]
#[command(
    name = "snake-duel",
    about = "Run headless two-player snake rounds between two autopilots"
)]
struct Args {
    /// Number of rounds to play back to back
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// Tick interval in milliseconds (overrides SNAKE_DUEL_TICK_MS)
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Countdown step in milliseconds (overrides SNAKE_DUEL_COUNTDOWN_MS)
    #[arg(long)]
    countdown_ms: Option<u64>,

    /// Food seed (overrides SNAKE_DUEL_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Never spawn food under a snake
    #[arg(long)]
    avoid_snakes: bool,

    /// Give up on a round that runs longer than this many ticks
    #[arg(long, default_value_t = 5000)]
    max_ticks: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if exists
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = SessionConfig::from_env().context("Invalid SNAKE_DUEL_* configuration")?;
    if let Some(tick_ms) = args.tick_ms {
        config.timing.tick_ms = tick_ms;
    }
    if let Some(countdown_ms) = args.countdown_ms {
        config.timing.countdown_step_ms = countdown_ms;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.avoid_snakes {
        config.round.food_placement = FoodPlacement::AvoidSnakes;
    }

    let replica = Arc::new(LocalReplica::new());
    let session = spawn_session(&config, replica.clone());
    let client = session.client();

    let host = ParticipantId::new();
    let guest = ParticipantId::new();
    client.join(host).await?;
    client.join(guest).await?;

    let autopilots = [
        spawn_autopilot(client.clone(), host, PlayerSlot::Player1, session.watch_state()),
        spawn_autopilot(client.clone(), guest, PlayerSlot::Player2, session.watch_state()),
    ];

    let mut state_rx = session.watch_state();
    for round in 1..=args.rounds {
        client.command(host, RoundCommand::Start).await?;

        let finished = wait_for_round(&mut state_rx, args.max_ticks).await?;
        let record = read_game_state(replica.as_ref())
            .await?
            .context("Round state was never published")?;

        match finished.winner {
            Some(Winner::Tie) => println!("Round {}: tie after {} ticks", round, finished.tick),
            Some(winner) => {
                println!("Round {}: {:?} wins after {} ticks", round, winner, finished.tick)
            }
            None => {
                println!("Round {}: no result after {} ticks, resetting", round, finished.tick);
                client.command(host, RoundCommand::Reset).await?;
            }
        }
        println!(
            "  score {} - {}",
            record.score.player1, record.score.player2
        );
    }

    let final_state = session.shutdown().await?;
    for autopilot in autopilots {
        autopilot.await.context("Autopilot task panicked")?;
    }
    info!(ticks = final_state.tick, "Session finished");

    Ok(())
}

/// Wait for the round that was just started to end, or to run past
/// `max_ticks`.
async fn wait_for_round(
    state_rx: &mut watch::Receiver<RoundState>,
    max_ticks: u32,
) -> Result<RoundState> {
    // The watch may still hold the previous round until the start lands
    state_rx
        .wait_for(|state| !state.is_over())
        .await
        .context("Session stopped before the round started")?;

    let state = state_rx
        .wait_for(|state| state.is_over() || state.tick >= max_ticks)
        .await
        .context("Session stopped mid-round")?;
    Ok(state.clone())
}
