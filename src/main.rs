//! Retro Rumble Demo
//!
//! Runs one scripted match against the engine: a manual move, a rejected
//! second move, a gesture round, then waits for the clock to close the match.
//!
//! Usage: `retro-rumble [config.json]`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use retro_rumble::{
    VERSION,
    capture::{RecognitionResponse, ScriptedCamera, ScriptedRecognizer},
    game::{events::GameEventData, rules::Move},
    runtime::{EngineConfig, EngineHandle, EngineUpdate, NoticeLevel},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Retro Rumble Engine v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("loading config {}", path))?,
        None => EngineConfig::default(),
    };
    info!(
        "Ruleset: {}, clock: {} s, seed: {:?}",
        config.match_config.ruleset, config.match_config.duration_secs, config.rng_seed
    );
    info!("Moves: {}", glyphs(config.match_config.ruleset.vocabulary()));
    info!("{}", config.match_config.ruleset.instructions());

    let gesture = config.match_config.ruleset.vocabulary()[4];
    let recognizer = ScriptedRecognizer::new(vec![Ok(RecognitionResponse::recognized(gesture))]);
    let reset_delay = Duration::from_millis(config.round_reset_delay_ms);
    let (engine, task) = EngineHandle::spawn(config, Arc::new(ScriptedCamera::granted()), Arc::new(recognizer))?;

    demo_match(&engine, reset_delay).await?;

    let (snapshot, hash) = engine.snapshot().await?;
    info!("=== Match Results ===");
    info!(
        "Health: player {} / opponent {}, winner: {:?} ({:?})",
        snapshot.health_player, snapshot.health_opponent, snapshot.winner, snapshot.end_reason
    );
    info!("Final State Hash: {}", hex::encode(hash));

    engine.shutdown();
    task.await.context("engine task panicked")?;
    Ok(())
}

/// Drive one match and log every update until it ends.
async fn demo_match(engine: &EngineHandle, reset_delay: Duration) -> Result<()> {
    info!("=== Starting Demo Match ===");
    let mut updates = engine.subscribe();
    let opening = engine.snapshot().await?.0.ruleset.vocabulary()[0];

    engine.submit_move(opening).await?;
    // Second move in the same round; the engine answers with a notice.
    engine.submit_move(opening).await?;

    tokio::time::sleep(reset_delay + Duration::from_millis(100)).await;
    engine.start_capture().await?;

    loop {
        match updates.recv().await {
            Ok(update) => {
                log_update(&update);
                if update.snapshot.terminal {
                    return Ok(());
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("Skipped {} updates", n),
            Err(broadcast::error::RecvError::Closed) => anyhow::bail!("engine stopped before the match ended"),
        }
    }
}

fn log_update(update: &EngineUpdate) {
    if let Some(notice) = &update.notice {
        match notice.level {
            NoticeLevel::Info => info!("{}: {}", notice.title, notice.description),
            NoticeLevel::Warning | NoticeLevel::Error => warn!("{}: {}", notice.title, notice.description),
        }
    }

    for event in &update.events {
        match &event.data {
            GameEventData::RoundResolved { record } => {
                info!("Round {}: {}", record.round, record.message);
            }
            GameEventData::MatchEnded { winner, reason, .. } => {
                info!("Match ended ({:?}), winner: {:?}", reason, winner);
            }
            GameEventData::ClockTicked { remaining } if remaining % 5 == 0 => {
                info!("{} s left", remaining);
            }
            _ => {}
        }
    }

    if let Some(status) = &update.snapshot.capture {
        tracing::debug!("Capture: {}", status);
    }
}

fn glyphs(moves: &[Move]) -> String {
    moves.iter().map(|m| m.glyph()).collect::<Vec<_>>().join(" ")
}
