mod config;
mod cpu;
mod dma;
mod emulator;
mod eventloop;
mod input;
mod memory;
mod ppu;
mod shared;
mod startup;
mod timer;

use std::sync::Arc;
use thiserror::Error;

pub use config::RunConfig;
pub use eventloop::RunError;
pub use input::Button;
pub use ppu::{FRAME_BUFFER_LEN, XRES, YRES};
pub use shared::SharedState;
pub use startup::StartupError;

#[derive(Error, Debug)]
pub enum EmulationError {
    #[error("{source}")]
    Startup {
        #[from]
        source: StartupError,
    },
    #[error("{source}")]
    Run {
        #[from]
        source: RunError,
    },
}

/// Results reported once the simulation stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u32,
    pub serial_output: String,
}

/// Load the cartridge named in `run_config` and run the emulator on the calling thread until
/// shutdown is requested through `shared`.
///
/// # Errors
///
/// Returns an error if the cartridge or its battery save cannot be loaded, if the CPU hits an
/// invalid opcode, or if the battery save cannot be written.
pub fn run(run_config: &RunConfig, shared: Arc<SharedState>) -> Result<RunSummary, EmulationError> {
    log::info!("Running with config:\n{run_config}");

    let mut emulator = startup::init_emulator(run_config, shared)?;

    eventloop::run(&mut emulator, run_config)?;

    Ok(RunSummary {
        frames: emulator.frames_completed(),
        serial_output: emulator.serial_output().into(),
    })
}
