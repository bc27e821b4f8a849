use crate::memory::AddressSpace;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("error serializing/deserializing state: {source}")]
    Serialization {
        #[from]
        source: bincode::Error,
    },
    #[error("error reading/writing state: {source}")]
    FileSystem {
        #[from]
        source: io::Error,
    },
}

pub fn determine_save_state_path(gb_file_path: &str) -> PathBuf {
    Path::new(gb_file_path).with_extension("ss0")
}

pub fn save_state<P>(state: &AddressSpace, path: P) -> Result<(), SaveStateError>
where
    P: AsRef<Path>,
{
    let serialized_state = bincode::serialize(state)?;
    fs::write(path.as_ref(), serialized_state)?;

    log::info!("Successfully wrote save state to '{}'", path.as_ref().display());

    Ok(())
}

pub fn load_state<P>(path: P) -> Result<AddressSpace, SaveStateError>
where
    P: AsRef<Path>,
{
    let serialized_state = fs::read(path.as_ref())?;
    let state = deserialize_state(&serialized_state)?;

    log::info!("Successfully loaded save state from '{}'", path.as_ref().display());

    Ok(state)
}

fn deserialize_state(bytes: &[u8]) -> Result<AddressSpace, SaveStateError> {
    // Layout, buffer size, and config are all revalidated while deserializing
    Ok(bincode::deserialize(bytes)?)
}
