//! gb-mcp binary.
//!
//! Runs the command server over stdin/stdout, or replays a script file.
//! Logs go to stderr; stdout is reserved for the protocol channel.

use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};

use log::{error, info};

use gb_engine::SimpleEngine;
use gb_mcp::command::Command;
use gb_mcp::{ControlService, Dispatcher, McpServer, RomDir, ServerConfig};

// ---------------------------------------------------------------------------
// CLI argument parsing
// ---------------------------------------------------------------------------

struct CliArgs {
    rom_path: Option<PathBuf>,
    rom_dir: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        rom_path: None,
        rom_dir: None,
        script: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rom" => {
                i += 1;
                cli.rom_path = args.get(i).map(PathBuf::from);
            }
            "--rom-dir" => {
                i += 1;
                cli.rom_dir = args.get(i).map(PathBuf::from);
            }
            "--script" => {
                i += 1;
                cli.script = args.get(i).map(PathBuf::from);
            }
            "--help" | "-h" => {
                eprintln!("Usage: gb-mcp [OPTIONS]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --rom <file>      Game Boy ROM to preload (.gb/.gbc)");
                eprintln!("  --rom-dir <dir>   Directory listed by list_roms [default: roms]");
                eprintln!("  --script <file>   Run a JSON script of commands, then exit");
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = parse_args();
    let mut config = ServerConfig::default();
    if let Some(dir) = cli.rom_dir {
        config.rom_dir = dir;
    }
    config.rom_path = cli.rom_path;

    // The engine is pluggable behind the gb_engine::Engine trait; the
    // reference engine keeps this binary self-contained.
    let service = ControlService::new(SimpleEngine::new());
    let mut dispatcher = Dispatcher::new(service, RomDir::new(&config.rom_dir));

    if let Some(ref path) = config.rom_path {
        if let Err(e) = dispatcher.dispatch(&Command::LoadRom { path: path.clone() }) {
            error!("failed to preload {}: {e}", path.display());
            process::exit(1);
        }
        info!("preloaded {}", path.display());
    }

    let server = McpServer::new(Arc::new(Mutex::new(dispatcher)));

    if let Some(ref script) = cli.script {
        if let Err(e) = server.run_script(script, io::stdout().lock()) {
            error!("script {} failed: {e}", script.display());
            process::exit(1);
        }
        return;
    }

    info!("serving on stdio (rom dir: {})", config.rom_dir.display());
    server.run();
}
