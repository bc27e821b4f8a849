pub mod address;
pub mod ioregisters;
pub mod layout;

use crate::config::{ConfigError, EmulatorConfig};
use crate::input::{ButtonLines, JoypadState};
use crate::memory::ioregisters::{InterruptFlags, InterruptType, RegisterBank};
use crate::memory::layout::{AccessPolicy, MemoryLayout, RegionKind};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address {address:#06X} is outside of the {size:#X}-byte address space")]
    OutOfRange { address: u32, size: usize },
}

#[derive(Error, Debug)]
pub enum CartridgeLoadError {
    #[error("error reading cartridge data: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("cartridge image is {len} bytes, cartridge region only holds {capacity}")]
    CapacityExceeded { len: usize, capacity: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidStateError {
    #[error("memory is {actual} bytes, its layout requires {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}

/// A raw cartridge image. The contents are opaque apart from the fixed-offset header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    raw_data: Vec<u8>,
}

impl Cartridge {
    pub fn new(raw_data: Vec<u8>) -> Self {
        Self { raw_data }
    }

    pub fn from_file<P>(file_path: P) -> Result<Self, CartridgeLoadError>
    where
        P: AsRef<Path>,
    {
        let raw_data = fs::read(file_path.as_ref())?;
        Ok(Self { raw_data })
    }

    pub fn len(&self) -> usize {
        self.raw_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_data.is_empty()
    }

    /// The raw 16 title bytes, or None if the image is too short to contain them.
    pub fn title_bytes(&self) -> Option<&[u8]> {
        let start = address::TITLE_START as usize;
        self.raw_data.get(start..start + address::TITLE_LEN)
    }

    /// The title as text, with trailing NUL padding removed and non-ASCII bytes replaced.
    pub fn title(&self) -> Option<String> {
        let bytes = self.title_bytes()?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Some(
            bytes[..end]
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { char::from(b) } else { '?' })
                .collect(),
        )
    }

    /// The 4 bytes at the entry point, usually a NOP followed by a jump into the program area.
    pub fn entry_point(&self) -> Option<&[u8]> {
        let start = address::ENTRY_POINT as usize;
        self.raw_data.get(start..start + 4)
    }

    /// Whether the image is long enough to contain the full header.
    pub fn has_header(&self) -> bool {
        self.raw_data.len() >= address::PROGRAM_START as usize
    }
}

/// The unified memory controller. Owns every byte of the address space and is the only way to
/// reach any of it, so that register side effects and access policies always apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SerializedAddressSpace")]
pub struct AddressSpace {
    layout: MemoryLayout,
    memory: Vec<u8>,
    io_registers: RegisterBank,
}

// Same fields as AddressSpace, checked before they are trusted
#[derive(Deserialize)]
struct SerializedAddressSpace {
    layout: MemoryLayout,
    memory: Vec<u8>,
    io_registers: RegisterBank,
}

impl TryFrom<SerializedAddressSpace> for AddressSpace {
    type Error = InvalidStateError;

    fn try_from(value: SerializedAddressSpace) -> Result<Self, Self::Error> {
        let SerializedAddressSpace { layout, memory, io_registers } = value;

        if memory.len() != layout.total_size() {
            return Err(InvalidStateError::SizeMismatch {
                expected: layout.total_size(),
                actual: memory.len(),
            });
        }
        io_registers.config().validate()?;

        Ok(Self { layout, memory, io_registers })
    }
}

impl AddressSpace {
    /// Create a zeroed address space with no cartridge loaded.
    pub fn new(layout: MemoryLayout, config: EmulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        log::debug!("Creating address space of {} bytes, {config}", layout.total_size());

        Ok(Self {
            memory: vec![0; layout.total_size()],
            layout,
            io_registers: RegisterBank::new(config),
        })
    }

    /// Copy a cartridge image into the cartridge region. Bytes past the end of the image are
    /// zeroed; an image larger than the region is rejected and nothing is copied.
    pub fn load_cartridge(&mut self, cartridge: &Cartridge) -> Result<(), CartridgeLoadError> {
        let range = self.region_range(RegionKind::Cartridge);
        let capacity = range.len();
        if cartridge.len() > capacity {
            return Err(CartridgeLoadError::CapacityExceeded {
                len: cartridge.len(),
                capacity,
            });
        }

        let region = &mut self.memory[range];
        region[..cartridge.len()].copy_from_slice(&cartridge.raw_data);
        region[cartridge.len()..].fill(0);

        log::info!("Loaded {}-byte cartridge image (capacity {capacity})", cartridge.len());

        Ok(())
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    pub fn config(&self) -> &EmulatorConfig {
        self.io_registers.config()
    }

    /// Total number of addressable bytes.
    pub fn size(&self) -> usize {
        self.memory.len()
    }

    fn region_range(&self, kind: RegionKind) -> Range<usize> {
        // Cartridge, register and stack regions are guaranteed by layout validation
        self.layout.region(kind).map_or(0..0, |region| {
            let start = region.start as usize;
            start..start + region.size
        })
    }

    /// Read a byte as the CPU would.
    pub fn read(&self, address: u32) -> Result<u8, MemoryError> {
        let resolved = self.layout.resolve(address)?;

        let value = match (resolved.policy, resolved.kind) {
            (AccessPolicy::Forbidden, _) => address::FORBIDDEN_READ_VALUE,
            (_, RegionKind::IoRegisters) => {
                let range = self.region_range(RegionKind::IoRegisters);
                self.io_registers.read(&self.memory[range], resolved.offset)
            }
            _ => self.memory[resolved.absolute],
        };

        Ok(value)
    }

    /// Write a byte as the CPU would. Writes that the target region does not accept are
    /// dropped without an error.
    pub fn write(&mut self, address: u32, value: u8) -> Result<(), MemoryError> {
        let resolved = self.layout.resolve(address)?;

        match (resolved.policy, resolved.kind) {
            (AccessPolicy::Forbidden, kind) => {
                log::trace!("Ignoring write of {value:02X} to forbidden {kind} address {address:04X}");
            }
            (AccessPolicy::ReadOnly, kind) => {
                log::debug!("Ignoring write of {value:02X} to read-only {kind} address {address:04X}");
            }
            (AccessPolicy::WriteIgnored, _) => {}
            (AccessPolicy::ReadWrite, RegionKind::IoRegisters) => {
                let range = self.region_range(RegionKind::IoRegisters);
                self.io_registers.write(&mut self.memory[range], resolved.offset, value);
            }
            (AccessPolicy::ReadWrite, _) => {
                self.memory[resolved.absolute] = value;
            }
        }

        Ok(())
    }

    /// Read a little-endian 16-bit value.
    pub fn read_u16(&self, address: u32) -> Result<u16, MemoryError> {
        let lsb = self.read(address)?;
        let msb = self.read(self.next_address(address)?)?;
        Ok(u16::from_le_bytes([lsb, msb]))
    }

    /// Write a little-endian 16-bit value. If the second byte is out of range the first byte has
    /// not been written.
    pub fn write_u16(&mut self, address: u32, value: u16) -> Result<(), MemoryError> {
        let next = self.next_address(address)?;
        self.layout.resolve(next)?;

        let [lsb, msb] = value.to_le_bytes();
        self.write(address, lsb)?;
        self.write(next, msb)
    }

    fn next_address(&self, address: u32) -> Result<u32, MemoryError> {
        address.checked_add(1).ok_or(MemoryError::OutOfRange {
            address,
            size: self.memory.len(),
        })
    }

    /// Copy out a whole region as the CPU would read it, e.g. VRAM or OAM for rendering.
    pub fn region_snapshot(&self, kind: RegionKind) -> Option<Vec<u8>> {
        let region = self.layout.region(kind)?;
        (u64::from(region.start)..region.end())
            .map(|address| self.read(address as u32).ok())
            .collect()
    }

    /// Advance the timer by the number of base clock cycles the last instruction took. Returns how
    /// many timer overflow interrupts were requested.
    pub fn tick(&mut self, cycles: u32) -> u32 {
        let range = self.region_range(RegionKind::IoRegisters);
        self.io_registers.tick(&mut self.memory[range], cycles)
    }

    /// Push the current state of every button into the input matrix.
    pub fn set_buttons(&mut self, joypad_state: &JoypadState) {
        self.set_button_lines(joypad_state.to_lines());
    }

    pub fn set_button_lines(&mut self, lines: ButtonLines) {
        let range = self.region_range(RegionKind::IoRegisters);
        self.io_registers.set_button_lines(&mut self.memory[range], lines);
    }

    pub fn button_lines(&self) -> ButtonLines {
        self.io_registers.button_lines()
    }

    /// Obtain a read/write view around the IF register (interrupt request flags).
    pub fn interrupt_flags(&mut self) -> InterruptFlags<'_> {
        let start = self.region_range(RegionKind::IoRegisters).start;
        InterruptFlags::new(&mut self.memory[start + address::IF_OFFSET])
    }

    pub fn timer_interrupt_requested(&self) -> bool {
        let start = self.region_range(RegionKind::IoRegisters).start;
        self.memory[start + address::IF_OFFSET] & InterruptType::Timer.bit() != 0
    }

    /// The IE register is the last byte of the stack region.
    pub fn get_ie_register(&self) -> u8 {
        let range = self.region_range(RegionKind::Stack);
        self.memory[range.end - 1]
    }

    /// Returns the highest priority interrupt that is both requested and enabled.
    pub fn highest_priority_interrupt(&mut self) -> Option<InterruptType> {
        let ie_value = self.get_ie_register();
        self.interrupt_flags().highest_priority_interrupt(ie_value)
    }
}
