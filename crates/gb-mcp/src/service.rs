//! Emulator control service.
//!
//! Sole owner of the one engine instance. Every operation is synchronous:
//! it does not return until the engine has processed every frame it
//! implies, and every mutating operation returns a fresh snapshot of the
//! resulting screen. The not-loaded precondition guards everything except
//! `load` itself.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use gb_engine::{Button, Engine, InputState};

use crate::error::ServiceError;
use crate::screen::{self, Snapshot};

/// Frames advanced immediately after a successful load. The engine's first
/// frames out of reset render nothing useful.
pub const WARMUP_FRAMES: u32 = 8;

/// State-machine wrapper around the single engine instance.
///
/// Constructed once per process with an explicitly owned engine — never a
/// module-level singleton, so multiple services can coexist in tests.
pub struct ControlService<E: Engine> {
    engine: E,
    rom_path: Option<PathBuf>,
}

impl<E: Engine> ControlService<E> {
    #[must_use]
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            rom_path: None,
        }
    }

    /// Whether a program image is resident.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.rom_path.is_some()
    }

    /// Path of the currently loaded image. Changes only on successful load.
    #[must_use]
    pub fn rom_path(&self) -> Option<&Path> {
        self.rom_path.as_deref()
    }

    /// Reference to the underlying engine.
    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Load a program image and advance the warm-up frames.
    ///
    /// `rom_path` changes only after the engine accepts the image; a failed
    /// load leaves the previous state intact.
    pub fn load(&mut self, path: &Path) -> Result<Snapshot, ServiceError> {
        let rom = fs::read(path).map_err(|source| ServiceError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        self.engine.load(&rom)?;
        self.rom_path = Some(path.to_path_buf());
        info!("loaded {} ({} bytes)", path.display(), rom.len());

        for _ in 0..WARMUP_FRAMES {
            self.engine.step_frame(InputState::NONE)?;
        }

        self.capture()
    }

    /// Press a button, holding for `hold_frames` frames total.
    ///
    /// The input mask rides the first stepped frame only; the remaining
    /// `hold_frames - 1` frames free-run with no input. The engine does not
    /// latch input across steps, so a multi-frame "hold" is one asserted
    /// frame followed by free-running — this is the contract, not an
    /// accident.
    pub fn press(&mut self, button: Button, hold_frames: u32) -> Result<Snapshot, ServiceError> {
        self.require_loaded()?;
        if hold_frames == 0 {
            return Err(ServiceError::InvalidArgument(
                "hold_frames must be at least 1".to_string(),
            ));
        }

        self.engine.step_frame(InputState::pressing(button))?;
        for _ in 1..hold_frames {
            self.engine.step_frame(InputState::NONE)?;
        }

        self.capture()
    }

    /// Advance exactly `count` frames with no input.
    pub fn wait_frames(&mut self, count: u32) -> Result<Snapshot, ServiceError> {
        self.require_loaded()?;
        if count == 0 {
            return Err(ServiceError::InvalidArgument(
                "count must be at least 1".to_string(),
            ));
        }

        for _ in 0..count {
            self.engine.step_frame(InputState::NONE)?;
        }

        self.capture()
    }

    /// Capture the current screen without advancing any frame.
    ///
    /// The only read-only operation on the service.
    pub fn snapshot(&self) -> Result<Snapshot, ServiceError> {
        self.require_loaded()?;
        self.capture()
    }

    /// Advance exactly one frame, then capture. Streaming/live-view callers
    /// poll this to approximate continuous motion.
    pub fn advance_and_snapshot(&mut self) -> Result<Snapshot, ServiceError> {
        self.require_loaded()?;
        self.engine.step_frame(InputState::NONE)?;
        self.capture()
    }

    fn require_loaded(&self) -> Result<(), ServiceError> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(ServiceError::NotLoaded)
        }
    }

    fn capture(&self) -> Result<Snapshot, ServiceError> {
        screen::capture(&self.engine)
    }
}
