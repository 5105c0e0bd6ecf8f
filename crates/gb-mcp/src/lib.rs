//! Remote command surface for a frame-stepped Game Boy engine.
//!
//! One engine instance per process, owned by the control service. Commands
//! (button presses, frame waits, ROM loads, screen captures) arrive over
//! one of two transports — a sequential JSON-RPC channel on stdin/stdout,
//! or multiplexed streaming sessions — and every command runs its full
//! frame sequence to completion before the next is dispatched.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mcp;
pub mod roms;
pub mod screen;
pub mod service;
pub mod session;

pub use command::Command;
pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use error::{DispatchError, ServiceError, SessionError};
pub use mcp::McpServer;
pub use roms::RomDir;
pub use screen::Snapshot;
pub use service::ControlService;
pub use session::{SessionHub, SessionId};
