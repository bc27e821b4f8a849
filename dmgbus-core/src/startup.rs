use crate::config::{ConfigError, RunConfig};
use crate::memory::layout::MemoryLayout;
use crate::memory::{AddressSpace, Cartridge, CartridgeLoadError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("error loading cartridge from {file_path}: {source}")]
    FileRead {
        file_path: String,
        #[source]
        source: CartridgeLoadError,
    },
    #[error("invalid emulator configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

/// Build a DMG address space and load the cartridge named in the run config into it.
pub fn init_address_space(run_config: &RunConfig) -> Result<AddressSpace, StartupError> {
    let file_read_error = |source| StartupError::FileRead {
        file_path: run_config.gb_file_path.clone(),
        source,
    };

    let cartridge = Cartridge::from_file(&run_config.gb_file_path).map_err(file_read_error)?;

    let mut address_space =
        AddressSpace::new(MemoryLayout::dmg(), run_config.emulator_config.clone())?;
    address_space.load_cartridge(&cartridge).map_err(file_read_error)?;

    match cartridge.title() {
        Some(title) => log::info!("Loaded cartridge '{title}' from {}", run_config.gb_file_path),
        None => log::warn!("Cartridge image is too short to contain a header"),
    }

    Ok(address_space)
}
