//! The static command set.
//!
//! Every supported command is a variant here, parsed and validated before
//! any state is touched. Unknown names are rejected at parse time; an
//! unhandled variant in the dispatcher is a compile error.

use std::path::PathBuf;

use serde_json::Value as JsonValue;

use gb_engine::Button;

use crate::error::DispatchError;

/// Upper bound on `duration_frames`, about one minute of emulated time at
/// 60 steps/second. Commands above the cap are rejected at validation
/// rather than interrupted mid-loop.
pub const MAX_DURATION_FRAMES: u32 = 3600;

/// A named, parameterized request mapped to exactly one service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `press_<button>` — press and hold for `duration_frames` frames.
    Press {
        button: Button,
        duration_frames: u32,
    },
    /// `wait_frames` — advance with no input.
    WaitFrames { duration_frames: u32 },
    /// `load_rom` — load an image by path or ROM-directory name.
    LoadRom { path: PathBuf },
    /// `get_screen` — advance one frame, then capture (live variant).
    GetScreen,
    /// `screenshot` — capture without advancing (polling variant).
    Screenshot,
    /// `is_rom_loaded` — report load state and image path.
    IsRomLoaded,
    /// `list_roms` — list the ROM directory.
    ListRoms,
}

impl Command {
    /// Parse and validate a named command.
    pub fn parse(name: &str, params: &JsonValue) -> Result<Self, DispatchError> {
        if let Some(button_name) = name.strip_prefix("press_") {
            let Some(button) = parse_button(button_name) else {
                return Err(DispatchError::UnknownCommand(name.to_string()));
            };
            return Ok(Self::Press {
                button,
                duration_frames: duration_frames(params, Some(1))?,
            });
        }

        match name {
            "wait_frames" => Ok(Self::WaitFrames {
                duration_frames: duration_frames(params, None)?,
            }),
            "load_rom" => {
                let path = match params.get("path").and_then(JsonValue::as_str) {
                    Some(p) if !p.is_empty() => PathBuf::from(p),
                    Some(_) => {
                        return Err(DispatchError::InvalidParameter {
                            field: "path",
                            reason: "must be a non-empty string".to_string(),
                        });
                    }
                    None => {
                        return Err(DispatchError::InvalidParameter {
                            field: "path",
                            reason: "missing required string".to_string(),
                        });
                    }
                };
                Ok(Self::LoadRom { path })
            }
            "get_screen" => Ok(Self::GetScreen),
            "screenshot" => Ok(Self::Screenshot),
            "is_rom_loaded" => Ok(Self::IsRomLoaded),
            "list_roms" => Ok(Self::ListRoms),
            _ => Err(DispatchError::UnknownCommand(name.to_string())),
        }
    }

    /// Whether this command requires a loaded ROM. `load_rom` is exempt;
    /// the status and listing commands answer regardless.
    #[must_use]
    pub fn requires_loaded(&self) -> bool {
        match self {
            Self::Press { .. } | Self::WaitFrames { .. } | Self::GetScreen | Self::Screenshot => {
                true
            }
            Self::LoadRom { .. } | Self::IsRomLoaded | Self::ListRoms => false,
        }
    }

    /// Wire name of this command.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Press { button, .. } => format!("press_{button}"),
            Self::WaitFrames { .. } => "wait_frames".to_string(),
            Self::LoadRom { .. } => "load_rom".to_string(),
            Self::GetScreen => "get_screen".to_string(),
            Self::Screenshot => "screenshot".to_string(),
            Self::IsRomLoaded => "is_rom_loaded".to_string(),
            Self::ListRoms => "list_roms".to_string(),
        }
    }
}

fn parse_button(name: &str) -> Option<Button> {
    Button::ALL.into_iter().find(|b| b.name() == name)
}

/// Extract and validate `duration_frames`. `default` of `None` makes the
/// field required.
fn duration_frames(params: &JsonValue, default: Option<u32>) -> Result<u32, DispatchError> {
    let value = match params.get("duration_frames") {
        None | Some(JsonValue::Null) => {
            return default.ok_or_else(|| DispatchError::InvalidParameter {
                field: "duration_frames",
                reason: "missing required integer".to_string(),
            });
        }
        Some(v) => v,
    };

    let Some(n) = value.as_u64() else {
        return Err(DispatchError::InvalidParameter {
            field: "duration_frames",
            reason: "must be a positive integer".to_string(),
        });
    };
    if n == 0 {
        return Err(DispatchError::InvalidParameter {
            field: "duration_frames",
            reason: "must be at least 1".to_string(),
        });
    }
    if n > u64::from(MAX_DURATION_FRAMES) {
        return Err(DispatchError::InvalidParameter {
            field: "duration_frames",
            reason: format!("exceeds maximum of {MAX_DURATION_FRAMES}"),
        });
    }

    Ok(n as u32)
}
