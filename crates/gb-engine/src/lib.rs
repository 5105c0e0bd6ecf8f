//! Engine trait and types for the Game Boy control service.
//!
//! The control service drives exactly one emulator engine, one frame at a
//! time. This crate defines the seam: the [`Engine`] trait, the button and
//! input-mask types the service passes across it, and a deterministic
//! reference engine for tests and headless use.

mod engine;
mod input;
mod simple;

pub use engine::{Engine, EngineError};
pub use input::{Button, InputState};
pub use simple::{FB_HEIGHT, FB_WIDTH, SimpleEngine};
