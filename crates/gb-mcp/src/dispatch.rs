//! Command dispatcher and response envelopes.
//!
//! One dispatcher per process, bound to the one control service and the
//! ROM directory. Both transports feed commands through here, so behavior
//! is identical regardless of which channel carried the request: validate,
//! check the precondition, invoke the service, wrap the result. Errors
//! come back as [`DispatchError`] for the transport to put on the wire.

use base64::Engine as _;
use serde::Serialize;
use serde_json::json;

use gb_engine::Engine;

use crate::command::Command;
use crate::error::{DispatchError, ServiceError};
use crate::roms::RomDir;
use crate::screen::Snapshot;
use crate::service::ControlService;

/// Uniform success envelope: a list of content items.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseBody {
    pub content: Vec<ContentItem>,
}

impl ResponseBody {
    fn image(snapshot: Snapshot) -> Self {
        Self {
            content: vec![ContentItem::Image {
                encoding: snapshot.mime,
                payload: base64::engine::general_purpose::STANDARD.encode(&snapshot.data),
            }],
        }
    }

    fn text(payload: String) -> Self {
        Self {
            content: vec![ContentItem::Text { payload }],
        }
    }
}

/// One item in a response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    /// An encoded image: mime type plus base64 payload.
    Image {
        encoding: &'static str,
        payload: String,
    },
    /// Serialized structured text.
    Text { payload: String },
}

/// Binds the control service and ROM directory behind the command set.
pub struct Dispatcher<E: Engine> {
    service: ControlService<E>,
    roms: RomDir,
}

impl<E: Engine> Dispatcher<E> {
    #[must_use]
    pub fn new(service: ControlService<E>, roms: RomDir) -> Self {
        Self { service, roms }
    }

    /// Reference to the control service.
    #[must_use]
    pub fn service(&self) -> &ControlService<E> {
        &self.service
    }

    /// Parse, validate, and execute a named command.
    pub fn dispatch_named(
        &mut self,
        name: &str,
        params: &serde_json::Value,
    ) -> Result<ResponseBody, DispatchError> {
        let command = Command::parse(name, params)?;
        self.dispatch(&command)
    }

    /// Execute an already-validated command.
    ///
    /// Runs the command's full frame sequence to completion; callers hold
    /// whatever lock serializes access to this dispatcher for the whole
    /// call, making each command an atomic critical section.
    pub fn dispatch(&mut self, command: &Command) -> Result<ResponseBody, DispatchError> {
        if command.requires_loaded() && !self.service.is_loaded() {
            return Err(ServiceError::NotLoaded.into());
        }

        match command {
            Command::Press {
                button,
                duration_frames,
            } => {
                let snapshot = self.service.press(*button, *duration_frames)?;
                Ok(ResponseBody::image(snapshot))
            }
            Command::WaitFrames { duration_frames } => {
                let snapshot = self.service.wait_frames(*duration_frames)?;
                Ok(ResponseBody::image(snapshot))
            }
            Command::LoadRom { path } => {
                let resolved = self.roms.resolve(path);
                let snapshot = self.service.load(&resolved)?;
                Ok(ResponseBody::image(snapshot))
            }
            Command::GetScreen => {
                let snapshot = self.service.advance_and_snapshot()?;
                Ok(ResponseBody::image(snapshot))
            }
            Command::Screenshot => {
                let snapshot = self.service.snapshot()?;
                Ok(ResponseBody::image(snapshot))
            }
            Command::IsRomLoaded => {
                let status = json!({
                    "loaded": self.service.is_loaded(),
                    "rom_path": self.service.rom_path().map(|p| p.display().to_string()),
                });
                Ok(ResponseBody::text(status.to_string()))
            }
            Command::ListRoms => {
                let listing = self.roms.list()?;
                let payload = serde_json::to_string(&listing)
                    .map_err(|e| ServiceError::Encode(e.to_string()))?;
                Ok(ResponseBody::text(payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    use serde_json::Value as JsonValue;

    use gb_engine::SimpleEngine;

    fn temp_rom_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gb-mcp-disp-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn dispatcher(rom_dir: &Path) -> Dispatcher<SimpleEngine> {
        Dispatcher::new(
            ControlService::new(SimpleEngine::new()),
            RomDir::new(rom_dir),
        )
    }

    fn first_item(body: &ResponseBody) -> &ContentItem {
        body.content.first().expect("non-empty content")
    }

    #[test]
    fn commands_before_load_are_rejected_without_stepping() {
        let dir = temp_rom_dir("unloaded");
        let mut dispatcher = dispatcher(&dir);

        for name in ["press_a", "press_start", "wait_frames", "get_screen", "screenshot"] {
            let params = serde_json::json!({"duration_frames": 2});
            let err = dispatcher.dispatch_named(name, &params).expect_err("dispatch");
            assert!(
                matches!(err, DispatchError::Service(ServiceError::NotLoaded)),
                "{name} should fail NotLoaded, got {err}"
            );
        }
        assert_eq!(dispatcher.service().engine().steps(), 0);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn load_then_screenshot_yields_stable_payload() {
        let dir = temp_rom_dir("stable");
        fs::write(dir.join("demo.gb"), [1u8, 2, 3, 4]).expect("write rom");
        let mut dispatcher = dispatcher(&dir);

        dispatcher
            .dispatch_named("load_rom", &serde_json::json!({"path": "demo.gb"}))
            .expect("load");

        let a = dispatcher
            .dispatch_named("screenshot", &JsonValue::Null)
            .expect("screenshot");
        let b = dispatcher
            .dispatch_named("screenshot", &JsonValue::Null)
            .expect("screenshot");

        let (ContentItem::Image { payload: pa, .. }, ContentItem::Image { payload: pb, .. }) =
            (first_item(&a), first_item(&b))
        else {
            panic!("expected image content");
        };
        assert!(!pa.is_empty());
        assert_eq!(pa, pb);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn get_screen_advances_between_captures() {
        let dir = temp_rom_dir("advance");
        fs::write(dir.join("demo.gb"), [1u8, 2, 3, 4]).expect("write rom");
        let mut dispatcher = dispatcher(&dir);

        dispatcher
            .dispatch_named("load_rom", &serde_json::json!({"path": "demo.gb"}))
            .expect("load");
        let before = dispatcher.service().engine().steps();

        dispatcher
            .dispatch_named("get_screen", &JsonValue::Null)
            .expect("get_screen");
        assert_eq!(dispatcher.service().engine().steps(), before + 1);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn is_rom_loaded_round_trips_the_path() {
        let dir = temp_rom_dir("roundtrip");
        let rom = dir.join("demo.gb");
        fs::write(&rom, [9u8; 8]).expect("write rom");
        let mut dispatcher = dispatcher(&dir);

        let body = dispatcher
            .dispatch_named("is_rom_loaded", &JsonValue::Null)
            .expect("status");
        let ContentItem::Text { payload } = first_item(&body) else {
            panic!("expected text content");
        };
        let status: JsonValue = serde_json::from_str(payload).expect("parse status");
        assert_eq!(status["loaded"], JsonValue::Bool(false));
        assert_eq!(status["rom_path"], JsonValue::Null);

        dispatcher
            .dispatch_named("load_rom", &serde_json::json!({"path": "demo.gb"}))
            .expect("load");

        let body = dispatcher
            .dispatch_named("is_rom_loaded", &JsonValue::Null)
            .expect("status");
        let ContentItem::Text { payload } = first_item(&body) else {
            panic!("expected text content");
        };
        let status: JsonValue = serde_json::from_str(payload).expect("parse status");
        assert_eq!(status["loaded"], JsonValue::Bool(true));
        assert_eq!(
            status["rom_path"],
            JsonValue::String(rom.display().to_string())
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn list_roms_on_empty_directory_is_empty_not_error() {
        let dir = temp_rom_dir("emptylist");
        let mut dispatcher = dispatcher(&dir);

        let body = dispatcher
            .dispatch_named("list_roms", &JsonValue::Null)
            .expect("list");
        let ContentItem::Text { payload } = first_item(&body) else {
            panic!("expected text content");
        };
        assert_eq!(payload, "[]");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn load_rom_missing_file_reports_not_found() {
        let dir = temp_rom_dir("missing");
        let mut dispatcher = dispatcher(&dir);

        let err = dispatcher
            .dispatch_named("load_rom", &serde_json::json!({"path": "ghost.gb"}))
            .expect_err("load");
        assert!(matches!(
            err,
            DispatchError::Service(ServiceError::NotFound { .. })
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn failed_command_leaves_state_unchanged() {
        let dir = temp_rom_dir("unchanged");
        fs::write(dir.join("demo.gb"), [5u8; 4]).expect("write rom");
        let mut dispatcher = dispatcher(&dir);

        dispatcher
            .dispatch_named("load_rom", &serde_json::json!({"path": "demo.gb"}))
            .expect("load");
        let steps = dispatcher.service().engine().steps();

        let err = dispatcher
            .dispatch_named("wait_frames", &serde_json::json!({"duration_frames": 0}))
            .expect_err("validation");
        assert!(matches!(err, DispatchError::InvalidParameter { .. }));
        assert_eq!(dispatcher.service().engine().steps(), steps);
        let _ = fs::remove_dir_all(dir);
    }
}
