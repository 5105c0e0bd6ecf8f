//! Screen codec: ARGB32 framebuffer → PNG snapshot.

use gb_engine::Engine;

use crate::error::ServiceError;

/// An encoded still image of the engine's current visual output.
///
/// Produced fresh on every capture, never cached; ownership transfers to
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Mime type of the encoded payload.
    pub mime: &'static str,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

/// Encode the engine's current framebuffer as a PNG snapshot.
pub fn capture<E: Engine>(engine: &E) -> Result<Snapshot, ServiceError> {
    let data = encode_png(
        engine.framebuffer(),
        engine.framebuffer_width(),
        engine.framebuffer_height(),
    )?;
    Ok(Snapshot {
        mime: "image/png",
        data,
    })
}

/// Encode an ARGB32 pixel buffer as PNG bytes.
fn encode_png(fb: &[u32], width: u32, height: u32) -> Result<Vec<u8>, ServiceError> {
    let mut png_buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ServiceError::Encode(e.to_string()))?;

        // Convert ARGB32 → RGBA bytes
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for &pixel in fb {
            rgba.push(((pixel >> 16) & 0xFF) as u8);
            rgba.push(((pixel >> 8) & 0xFF) as u8);
            rgba.push((pixel & 0xFF) as u8);
            rgba.push(0xFF);
        }

        writer
            .write_image_data(&rgba)
            .map_err(|e| ServiceError::Encode(e.to_string()))?;
    }
    Ok(png_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gb_engine::{InputState, SimpleEngine};

    #[test]
    fn capture_produces_png_payload() {
        let mut engine = SimpleEngine::new();
        engine.load(&[1, 2, 3]).expect("load");
        engine.step_frame(InputState::NONE).expect("step");

        let snapshot = capture(&engine).expect("capture");
        assert_eq!(snapshot.mime, "image/png");
        // PNG signature
        assert_eq!(&snapshot.data[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn capture_is_stable_without_steps() {
        let mut engine = SimpleEngine::new();
        engine.load(&[7; 32]).expect("load");
        engine.step_frame(InputState::NONE).expect("step");

        let a = capture(&engine).expect("capture");
        let b = capture(&engine).expect("capture");
        assert_eq!(a, b);
    }
}
