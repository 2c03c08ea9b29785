//! Session lifecycle and the multi-session [`FlowRunner`].
//!
//! A session is one end-user conversation walking one flow graph. The runner
//! spawns a driver task per session and exposes a small control surface:
//! submit input, cancel, query status, subscribe to events.

pub mod config;
mod driver;
pub mod runner;
pub mod state;

pub use config::RunnerConfig;
pub use runner::{FlowRunner, RunnerError};
pub use state::{InboundEvent, SessionStatus};
