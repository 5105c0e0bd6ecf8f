//! The engine capability trait.

use thiserror::Error;

use crate::input::InputState;

/// Error raised by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The ROM image was rejected at load time.
    #[error("invalid ROM: {0}")]
    InvalidRom(String),
    /// The engine faulted while stepping a frame.
    #[error("engine fault: {0}")]
    Fault(String),
}

/// A frame-steppable emulator engine.
///
/// The contract is deliberately minimal: load a program image, advance
/// exactly one frame with a given input mask, expose the current visual
/// output. The control service never assumes anything about the engine's
/// internals, so any conformant implementation substitutes transparently —
/// including [`crate::SimpleEngine`], which counts steps deterministically.
pub trait Engine {
    /// Load a program image, resetting all engine state.
    fn load(&mut self, rom: &[u8]) -> Result<(), EngineError>;

    /// Advance exactly one frame with the given input mask asserted.
    ///
    /// The mask applies to this frame only; the engine must not latch it
    /// across calls.
    fn step_frame(&mut self, input: InputState) -> Result<(), EngineError>;

    /// Current visual output as ARGB32 pixels, row-major.
    fn framebuffer(&self) -> &[u32];

    /// Framebuffer width in pixels.
    fn framebuffer_width(&self) -> u32;

    /// Framebuffer height in pixels.
    fn framebuffer_height(&self) -> u32;
}
