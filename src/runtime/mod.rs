//! Runtime Layer
//!
//! The engine task and its message types.
//! This layer is **non-deterministic** - all match rules run through `game/`.

pub mod protocol;
pub mod session;
pub mod engine;

pub use protocol::{EngineCommand, EngineUpdate, MatchSnapshot, Notice, NoticeLevel};
pub use session::{CaptureResolution, CaptureTicket, MatchSession, SessionError};
pub use engine::{ConfigError, EngineConfig, EngineError, EngineHandle};
