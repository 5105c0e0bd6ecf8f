//! Server configuration.

use std::path::PathBuf;

/// Configuration assembled from CLI arguments at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory scanned for ROM images. Defaults to `roms`.
    pub rom_dir: PathBuf,
    /// Image preloaded at startup, if any. A preload failure is fatal.
    pub rom_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rom_dir: PathBuf::from("roms"),
            rom_path: None,
        }
    }
}
