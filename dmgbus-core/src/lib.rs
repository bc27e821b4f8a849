//! The memory-mapped I/O controller of a Game Boy style handheld: a bounds-checked, segmented
//! address space with the timer, divider, input matrix, and interrupt flag side effects that
//! software written against the real hardware relies on.
//!
//! The CPU engine drives it through [`AddressSpace::read`], [`AddressSpace::write`], and
//! [`AddressSpace::tick`]; nothing else has access to the backing memory.

mod config;
mod display;
mod input;
pub mod memory;
mod serialize;
mod startup;
mod timer;

pub use config::{ConfigError, EmulatorConfig, InputConfig, RunConfig, SelectPolarity, TimerConfig};
pub use display::{Display, FrameBuffer, SCREEN_HEIGHT, SCREEN_PIXELS, SCREEN_WIDTH};
pub use input::{Button, ButtonLines, JoypadState};
pub use memory::ioregisters::{InterruptType, RegisterKind};
pub use memory::layout::{AccessPolicy, LayoutError, MemoryLayout, RegionKind, RegionSpec};
pub use memory::{AddressSpace, Cartridge, CartridgeLoadError, InvalidStateError, MemoryError};
pub use serialize::{determine_save_state_path, load_state, save_state, SaveStateError};
pub use startup::{init_address_space, StartupError};
pub use timer::TimerControl;
