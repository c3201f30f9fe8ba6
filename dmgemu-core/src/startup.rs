use crate::config::RunConfig;
use crate::emulator::Emulator;
use crate::memory::cartridge;
use crate::memory::{BatteryError, Cartridge, CartridgeLoadError};
use crate::shared::SharedState;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("error loading cartridge from {file_path}: {source}")]
    FileRead {
        file_path: String,
        #[source]
        source: CartridgeLoadError,
    },
    #[error("error loading battery save: {source}")]
    BatteryLoad {
        #[from]
        source: BatteryError,
    },
}

pub fn init_emulator(
    run_config: &RunConfig,
    shared: Arc<SharedState>,
) -> Result<Emulator, StartupError> {
    let mut cartridge = match Cartridge::load(&run_config.gb_file_path) {
        Ok(cartridge) => cartridge,
        Err(err) => {
            return Err(StartupError::FileRead {
                file_path: run_config.gb_file_path.clone(),
                source: err,
            })
        }
    };

    let battery_path = cartridge::battery_path(&run_config.gb_file_path, &run_config.save_dir);
    if cartridge.has_battery() {
        cartridge.load_battery(&battery_path)?;
    }

    Ok(Emulator::new(cartridge, battery_path, shared))
}
