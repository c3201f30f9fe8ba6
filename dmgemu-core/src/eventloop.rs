use crate::config::RunConfig;
use crate::cpu::ParseError;
use crate::emulator::Emulator;
use crate::memory::BatteryError;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

// 1 / 59.7 Hz
const FRAME_DURATION: Duration = Duration::from_nanos(16_750_419);

#[derive(Error, Debug)]
pub enum RunError {
    #[error("error parsing CPU instruction: {source}")]
    InstructionParse {
        #[from]
        source: ParseError,
    },
    #[error("error writing battery save: {source}")]
    BatterySave {
        #[from]
        source: BatteryError,
    },
}

/// Run the simulation until shutdown is requested through the shared state or the CPU hits an
/// invalid opcode. Cartridge RAM is flushed to the battery file on the way out either way.
pub fn run(emulator: &mut Emulator, run_config: &RunConfig) -> Result<(), RunError> {
    let result = run_loop(emulator, run_config);

    if let Err(err) = emulator.flush_battery() {
        log::error!("Error flushing battery save on exit: {err}");
        result?;
        return Err(err.into());
    }

    result
}

fn run_loop(emulator: &mut Emulator, run_config: &RunConfig) -> Result<(), RunError> {
    let mut next_frame_time = Instant::now() + FRAME_DURATION;

    loop {
        if emulator.shared().shutdown_requested() {
            log::info!("Shutdown requested after {} frames", emulator.frames_completed());
            return Ok(());
        }

        if emulator.shared().is_paused() {
            std::hint::spin_loop();
            thread::yield_now();
            continue;
        }

        if !emulator.step()? {
            continue;
        }

        emulator.flush_battery()?;

        if run_config.limit_frame_rate {
            let now = Instant::now();
            if now < next_frame_time {
                thread::sleep(next_frame_time - now);
            }
            next_frame_time = next_frame_time.max(now) + FRAME_DURATION;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::cartridge::tests::test_rom;
    use crate::memory::Cartridge;
    use crate::shared::SharedState;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn run_config() -> RunConfig {
        RunConfig {
            gb_file_path: "loop.gb".into(),
            save_dir: PathBuf::from("."),
            limit_frame_rate: false,
        }
    }

    #[test]
    fn stops_on_shutdown() {
        let shared = Arc::new(SharedState::new());
        let mut rom = test_rom(0x00, 2, 0x00);
        // JR -2
        rom[0x0100..0x0102].copy_from_slice(&[0x18, 0xFE]);
        let cartridge = Cartridge::new(rom).unwrap();
        let mut emulator = Emulator::new(cartridge, PathBuf::from("loop.battery"), Arc::clone(&shared));

        let handle = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                while shared.frame_counter() < 2 {
                    thread::sleep(Duration::from_millis(1));
                }
                shared.request_shutdown();
            })
        };

        run(&mut emulator, &run_config()).unwrap();
        handle.join().unwrap();

        assert!(emulator.frames_completed() >= 2);
    }

    #[test]
    fn invalid_opcode_ends_run() {
        let mut rom = test_rom(0x00, 2, 0x00);
        rom[0x0100] = 0xDD;
        let cartridge = Cartridge::new(rom).unwrap();
        let mut emulator =
            Emulator::new(cartridge, PathBuf::from("loop.battery"), Arc::new(SharedState::new()));

        let result = run(&mut emulator, &run_config());
        assert!(matches!(result, Err(RunError::InstructionParse { .. })));
    }
}
