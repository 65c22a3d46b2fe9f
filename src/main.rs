use std::env;
use std::fs;
use std::process::ExitCode;

use lynx_mp_core::scheduler::{OrientationConfig, Scheduler, SchedulerConfig};

/// Minimal headless driver: boots a home-cartridge image across N
/// consoles and runs a fixed number of frames, logging cycle counts.
/// Video/audio sinks and input polling are a host-frontend concern left
/// to an actual embedder; this binary only exercises the scheduler.
fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let cart_path = match args.next() {
        Some(p) => p,
        None => {
            eprintln!("usage: lynx-mp-core <cartridge.lnx> [players] [frames]");
            return ExitCode::FAILURE;
        }
    };
    let players: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let frames: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60);

    let cartridge_bytes = match fs::read(&cart_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("failed to read {cart_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let boot_rom = [0u8; 512];

    let config = SchedulerConfig {
        cycles_per_frame: 16_000_000 / 60,
        players,
        orientation: OrientationConfig::None,
        connect_comlynx: players > 1,
    };

    let mut scheduler = Scheduler::new();
    if let Err(e) = scheduler.boot(&config, &cartridge_bytes, &boot_rom) {
        log::error!("failed to boot cartridge: {e}");
        return ExitCode::FAILURE;
    }

    for frame in 0..frames {
        scheduler.update_buttons(|_player| 0);
        scheduler.advance_synchronized();
        scheduler.fetch_audio_samples();
        if frame % 60 == 0 {
            for i in 0..scheduler.player_count() {
                let console = scheduler.console(i).unwrap();
                log::info!("player {i}: cycle_count={}", console.cycle_count());
            }
        }
    }

    ExitCode::SUCCESS
}
