//! Match Engine
//!
//! One tokio task owns the `MatchSession`. Commands from the presentation
//! layer, capture progress, capture results and round-reset timers all
//! arrive on one bounded queue and are handled in arrival order, next to
//! the engine's own clock interval. After every transition the engine
//! broadcasts an `EngineUpdate`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::capture::camera::Camera;
use crate::capture::pipeline::{CaptureConfig, CapturePipeline};
use crate::capture::recognizer::Recognizer;
use crate::capture::session::{CaptureFailure, CaptureStatus};
use crate::core::hash::StateHash;
use crate::game::rules::Move;
use crate::game::state::{MatchConfig, MoveSource};
use crate::runtime::protocol::{EngineCommand, EngineUpdate, MatchSnapshot, Notice};
use crate::runtime::session::{CaptureResolution, CaptureTicket, MatchSession, SessionError};

// =============================================================================
// CONFIG
// =============================================================================

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rules, clock and health for each match
    pub match_config: MatchConfig,
    /// Capture countdown and recognizer timeout
    pub capture: CaptureConfig,
    /// Milliseconds per match clock second
    pub clock_interval_ms: u64,
    /// How long a resolved round stays on screen before re-arming
    pub round_reset_delay_ms: u64,
    /// Fixed opponent seed (replays and tests). Derived per match if unset.
    pub rng_seed: Option<u64>,
    /// Engine queue capacity
    pub command_buffer: usize,
    /// Update broadcast capacity
    pub update_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            capture: CaptureConfig::default(),
            clock_interval_ms: 1000,
            round_reset_delay_ms: 1500,
            rng_seed: None,
            command_buffer: 64,
            update_buffer: 256,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.match_config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.clock_interval_ms == 0 {
            return Err(ConfigError::Invalid("clock_interval_ms must be positive".into()));
        }
        if self.capture.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("capture.tick_interval_ms must be positive".into()));
        }
        if self.capture.recognition_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "capture.recognition_timeout_ms must be positive".into(),
            ));
        }
        if self.command_buffer == 0 || self.update_buffer == 0 {
            return Err(ConfigError::Invalid("channel buffers must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config is not valid JSON for `EngineConfig`.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config parsed but holds an unusable value.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine task has stopped.
    #[error("Engine closed")]
    Closed,
}

// =============================================================================
// ENGINE TASK
// =============================================================================

/// Everything the engine task reacts to, besides its clock.
#[derive(Debug)]
enum EngineEvent {
    Command(EngineCommand),
    CaptureProgress {
        ticket: CaptureTicket,
        status: CaptureStatus,
    },
    CaptureFinished {
        ticket: CaptureTicket,
        result: Result<Move, CaptureFailure>,
    },
    RoundResetDue {
        epoch: u64,
        round: u32,
    },
    Query(oneshot::Sender<(MatchSnapshot, StateHash)>),
}

struct Engine {
    config: EngineConfig,
    session: MatchSession,
    pipeline: CapturePipeline,
    events_tx: mpsc::WeakSender<EngineEvent>,
    updates: broadcast::Sender<EngineUpdate>,
    capture_task: Option<JoinHandle<()>>,
    reset_task: Option<JoinHandle<()>>,
}

impl Engine {
    fn clock_period(&self) -> Duration {
        Duration::from_millis(self.config.clock_interval_ms)
    }

    fn new_clock(&self) -> Interval {
        let period = self.clock_period();
        let mut clock = interval_at(Instant::now() + period, period);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        clock
    }

    async fn run(
        mut self,
        mut events_rx: mpsc::Receiver<EngineEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        info!("Engine started, match {}", self.session.id());
        let mut clock = self.new_clock();
        self.publish(None);

        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    match event {
                        Some(event) => self.handle(event, &mut clock),
                        None => {
                            debug!("All engine handles dropped");
                            break;
                        }
                    }
                }
                _ = clock.tick(), if !self.session.state().is_terminal() => {
                    self.on_clock();
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.abort_tasks();
        info!("Engine stopped");
    }

    fn handle(&mut self, event: EngineEvent, clock: &mut Interval) {
        match event {
            EngineEvent::Command(EngineCommand::SubmitMove { mv }) => self.on_submit(mv),
            EngineEvent::Command(EngineCommand::StartCapture) => self.on_start_capture(),
            EngineEvent::Command(EngineCommand::ResetMatch) => {
                self.on_reset();
                *clock = self.new_clock();
            }
            EngineEvent::CaptureProgress { ticket, status } => {
                if self.session.capture_progress(ticket, status) {
                    self.publish(None);
                }
            }
            EngineEvent::CaptureFinished { ticket, result } => self.on_capture_finished(ticket, result),
            EngineEvent::RoundResetDue { epoch, round } => {
                if self.session.reset_round(epoch, round) {
                    self.publish(None);
                }
            }
            EngineEvent::Query(reply) => {
                let _ = reply.send((self.session.snapshot(), self.session.state().compute_hash()));
            }
        }
    }

    fn on_submit(&mut self, mv: Move) {
        match self.session.submit_move(mv, MoveSource::Manual) {
            Ok(report) => {
                // The manual move decided the round; its gesture is moot.
                if self.session.active_capture().is_some() {
                    self.cancel_capture();
                }
                self.after_move(report.match_ended);
                self.publish(None);
            }
            Err(e) => self.publish(Some(notice_for(&e))),
        }
    }

    fn on_start_capture(&mut self) {
        let ticket = match self.session.begin_capture() {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("Capture refused: {}", e);
                self.publish(Some(notice_for(&e)));
                return;
            }
        };

        let Some(tx) = self.events_tx.upgrade() else {
            return;
        };
        let pipeline = self.pipeline.clone();
        let ruleset = self.session.state().ruleset();

        self.capture_task = Some(tokio::spawn(async move {
            let progress_tx = tx.clone();
            let result = pipeline
                .run(ruleset, move |status| {
                    // Progress is display-only; a full queue just skips a frame.
                    let _ = progress_tx.try_send(EngineEvent::CaptureProgress {
                        ticket,
                        status: status.clone(),
                    });
                })
                .await;
            let _ = tx.send(EngineEvent::CaptureFinished { ticket, result }).await;
        }));

        self.publish(None);
    }

    fn on_capture_finished(&mut self, ticket: CaptureTicket, result: Result<Move, CaptureFailure>) {
        let notice = match self.session.finish_capture(ticket, result) {
            CaptureResolution::Stale => return,
            CaptureResolution::Accepted(report) => {
                self.after_move(report.match_ended);
                None
            }
            CaptureResolution::Rejected(rejection) => Some(Notice::from_rejection(&rejection)),
            CaptureResolution::Failed(failure) => Notice::from_capture_failure(&failure),
        };
        self.capture_task = None;
        self.publish(notice);
    }

    fn on_clock(&mut self) {
        let epoch = self.session.epoch();
        if let Some(result) = self.session.tick_clock(epoch) {
            if result.match_ended {
                self.on_match_end();
            }
            self.publish(None);
        }
    }

    fn on_reset(&mut self) {
        self.abort_tasks();
        self.session.reset_match();
        self.publish(None);
    }

    /// Schedule the next round, or wind down if the match just ended.
    fn after_move(&mut self, match_ended: bool) {
        if match_ended {
            self.on_match_end();
            return;
        }

        let Some(tx) = self.events_tx.upgrade() else {
            return;
        };
        let delay = Duration::from_millis(self.config.round_reset_delay_ms);
        let epoch = self.session.epoch();
        let round = self.session.state().round_number();

        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
        self.reset_task = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(EngineEvent::RoundResetDue { epoch, round }).await;
        }));
    }

    fn on_match_end(&mut self) {
        self.cancel_capture();
        info!(
            "Final state hash {}",
            hex::encode(self.session.state().compute_hash())
        );
    }

    fn cancel_capture(&mut self) {
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
        if let Some(ticket) = self.session.cancel_capture() {
            debug!("Capture {} stopped", ticket.capture_id);
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
        if let Some(task) = self.reset_task.take() {
            task.abort();
        }
    }

    fn publish(&mut self, notice: Option<Notice>) {
        let update = EngineUpdate {
            snapshot: self.session.snapshot(),
            notice,
            events: self.session.take_events(),
        };

        #[cfg(feature = "debug-tracing")]
        {
            if let Ok(json) = update.snapshot.to_json() {
                debug!("Snapshot {}", json);
            }
        }

        // No subscribers is fine; the next update carries the full snapshot.
        let _ = self.updates.send(update);
    }
}

fn notice_for(error: &SessionError) -> Notice {
    match error {
        SessionError::Move(rejection) => Notice::from_rejection(rejection),
        SessionError::CaptureInProgress => {
            Notice::capture_unavailable("A gesture capture is already running.")
        }
        SessionError::CaptureUnavailable(_) => {
            Notice::capture_unavailable("Wait for the next round before capturing a gesture.")
        }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Client side of a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    events_tx: mpsc::Sender<EngineEvent>,
    updates: broadcast::Sender<EngineUpdate>,
    shutdown_tx: broadcast::Sender<()>,
}

impl EngineHandle {
    /// Validate the config and start the engine task.
    pub fn spawn(
        config: EngineConfig,
        camera: Arc<dyn Camera>,
        recognizer: Arc<dyn Recognizer>,
    ) -> Result<(Self, JoinHandle<()>), ConfigError> {
        config.validate()?;
        let session = MatchSession::new(config.match_config.clone(), config.rng_seed)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let (events_tx, events_rx) = mpsc::channel(config.command_buffer);
        let (updates, _) = broadcast::channel(config.update_buffer);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let engine = Engine {
            session,
            pipeline: CapturePipeline::new(camera, recognizer, config.capture.clone()),
            events_tx: events_tx.downgrade(),
            updates: updates.clone(),
            capture_task: None,
            reset_task: None,
            config,
        };
        let task = tokio::spawn(engine.run(events_rx, shutdown_rx));

        Ok((
            Self {
                events_tx,
                updates,
                shutdown_tx,
            },
            task,
        ))
    }

    /// Receive every update published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineUpdate> {
        self.updates.subscribe()
    }

    /// Send a command.
    pub async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.events_tx
            .send(EngineEvent::Command(command))
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// Play a move directly.
    #[instrument(skip(self))]
    pub async fn submit_move(&self, mv: Move) -> Result<(), EngineError> {
        self.send(EngineCommand::SubmitMove { mv }).await
    }

    /// Start a fresh match.
    #[instrument(skip(self))]
    pub async fn reset_match(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::ResetMatch).await
    }

    /// Start a gesture capture for the current round.
    #[instrument(skip(self))]
    pub async fn start_capture(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::StartCapture).await
    }

    /// Current snapshot and state hash.
    pub async fn snapshot(&self) -> Result<(MatchSnapshot, StateHash), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.events_tx
            .send(EngineEvent::Query(reply))
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Stop the engine task.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::recognizer::RecognitionResponse;
    use crate::capture::scripted::{ScriptedCamera, ScriptedRecognizer};
    use crate::game::state::RoundState;

    fn spawn(recognizer: ScriptedRecognizer) -> (EngineHandle, JoinHandle<()>) {
        let config = EngineConfig {
            rng_seed: Some(42),
            ..Default::default()
        };
        EngineHandle::spawn(config, Arc::new(ScriptedCamera::granted()), Arc::new(recognizer)).unwrap()
    }

    async fn next_matching<F>(rx: &mut broadcast::Receiver<EngineUpdate>, mut pred: F) -> EngineUpdate
    where
        F: FnMut(&EngineUpdate) -> bool,
    {
        loop {
            let update = rx.recv().await.unwrap();
            if pred(&update) {
                return update;
            }
        }
    }

    #[test]
    fn test_config_from_json() {
        let config = EngineConfig::from_json_str(
            r#"{"match_config":{"ruleset":"themed"},"round_reset_delay_ms":500}"#,
        )
        .unwrap();
        assert_eq!(config.match_config.duration_secs, 15);
        assert_eq!(config.round_reset_delay_ms, 500);
        assert_eq!(config.command_buffer, 64);

        assert!(matches!(
            EngineConfig::from_json_str(r#"{"clock_interval_ms":0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(EngineConfig::from_json_str("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            EngineConfig::load("/nonexistent/retro-rumble.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_move_then_round_reset() {
        let (handle, _task) = spawn(ScriptedRecognizer::new(Vec::new()));
        let mut rx = handle.subscribe();

        handle.submit_move(Move::Rock).await.unwrap();
        let resolved = next_matching(&mut rx, |u| u.snapshot.last_outcome.is_some()).await;
        assert_eq!(resolved.snapshot.round_state, RoundState::Resolved);
        assert!(!resolved.events.is_empty());

        let armed = next_matching(&mut rx, |u| u.snapshot.round_number == 2).await;
        assert_eq!(armed.snapshot.round_state, RoundState::Idle);
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_submit_gets_illegal_move_notice() {
        let (handle, _task) = spawn(ScriptedRecognizer::new(Vec::new()));
        let mut rx = handle.subscribe();

        handle.submit_move(Move::Paper).await.unwrap();
        handle.submit_move(Move::Rock).await.unwrap();

        let update = next_matching(&mut rx, |u| u.notice.is_some()).await;
        let notice = update.notice.unwrap();
        assert_eq!(notice.title, "Illegal move");
        assert_eq!(
            update.snapshot.last_outcome.map(|r| r.player_move),
            Some(Move::Paper)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gesture_capture_plays_round() {
        let recognizer = ScriptedRecognizer::new(vec![Ok(RecognitionResponse::recognized(Move::Lizard))]);
        let (handle, _task) = spawn(recognizer);
        let mut rx = handle.subscribe();

        handle.start_capture().await.unwrap();
        let update = next_matching(&mut rx, |u| u.snapshot.last_outcome.is_some()).await;

        let record = update.snapshot.last_outcome.unwrap();
        assert_eq!(record.player_move, Move::Lizard);
        assert_eq!(record.source, MoveSource::Gesture);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let (handle, task) = spawn(ScriptedRecognizer::new(Vec::new()));
        handle.shutdown();
        task.await.unwrap();
        assert_eq!(handle.submit_move(Move::Rock).await, Err(EngineError::Closed));
    }
}
