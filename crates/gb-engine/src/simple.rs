//! Deterministic reference engine.
//!
//! `SimpleEngine` stands in for a real emulator core: it counts frame
//! steps, records the input mask passed to each step, and renders a
//! procedural framebuffer derived from the step count and ROM bytes. Two
//! engines given the same ROM and the same step sequence produce identical
//! framebuffers, which makes it the engine of choice for tests and for
//! exercising the command surface without a real core.

use crate::engine::{Engine, EngineError};
use crate::input::InputState;

/// Game Boy LCD width in pixels.
pub const FB_WIDTH: u32 = 160;

/// Game Boy LCD height in pixels.
pub const FB_HEIGHT: u32 = 144;

/// The four DMG shades as ARGB32, lightest first.
const SHADES: [u32; 4] = [0xFFE0_F8D0, 0xFF88_C070, 0xFF34_6856, 0xFF08_1820];

/// Deterministic step-counting engine.
pub struct SimpleEngine {
    rom_sum: u32,
    loaded: bool,
    steps: u64,
    input_log: Vec<InputState>,
    fb: Vec<u32>,
}

impl SimpleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rom_sum: 0,
            loaded: false,
            steps: 0,
            input_log: Vec::new(),
            fb: vec![SHADES[0]; (FB_WIDTH * FB_HEIGHT) as usize],
        }
    }

    /// Frame steps executed since the last load.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Input mask passed to each step since the last load, in order.
    ///
    /// One entry per step; grows by a byte per frame, which is fine for the
    /// test and headless runs this engine exists for.
    #[must_use]
    pub fn input_log(&self) -> &[InputState] {
        &self.input_log
    }

    /// Whether a ROM has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn render(&mut self) {
        // xorshift-mixed seed so consecutive frames differ visibly
        let mut seed = self
            .steps
            .wrapping_mul(0x9E37_79B9)
            .wrapping_add(u64::from(self.rom_sum));
        seed ^= seed >> 17;

        for y in 0..FB_HEIGHT {
            for x in 0..FB_WIDTH {
                let v = u64::from(x / 8) + u64::from(y / 8) + seed;
                self.fb[(y * FB_WIDTH + x) as usize] = SHADES[(v % 4) as usize];
            }
        }
    }
}

impl Engine for SimpleEngine {
    fn load(&mut self, rom: &[u8]) -> Result<(), EngineError> {
        if rom.is_empty() {
            return Err(EngineError::InvalidRom("empty image".to_string()));
        }

        self.rom_sum = rom
            .iter()
            .fold(0u32, |acc, &b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        self.loaded = true;
        self.steps = 0;
        self.input_log.clear();
        self.fb.fill(SHADES[0]);
        Ok(())
    }

    fn step_frame(&mut self, input: InputState) -> Result<(), EngineError> {
        if !self.loaded {
            return Err(EngineError::Fault("step before load".to_string()));
        }

        self.steps += 1;
        self.input_log.push(input);
        self.render();
        Ok(())
    }

    fn framebuffer(&self) -> &[u32] {
        &self.fb
    }

    fn framebuffer_width(&self) -> u32 {
        FB_WIDTH
    }

    fn framebuffer_height(&self) -> u32 {
        FB_HEIGHT
    }
}

impl Default for SimpleEngine {
    fn default() -> Self {
        Self::new()
    }
}
