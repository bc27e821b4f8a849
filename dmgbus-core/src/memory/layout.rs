use crate::memory::address;
use crate::memory::MemoryError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    Cartridge,
    VRam,
    ExternalRam,
    WorkingRam,
    Prohibited,
    Oam,
    Unusable,
    IoRegisters,
    Stack,
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cartridge => "cartridge",
            Self::VRam => "vram",
            Self::ExternalRam => "external_ram",
            Self::WorkingRam => "working_ram",
            Self::Prohibited => "prohibited",
            Self::Oam => "oam",
            Self::Unusable => "unusable",
            Self::IoRegisters => "io_registers",
            Self::Stack => "stack",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPolicy {
    ReadWrite,
    // Populated by the cartridge loader only; CPU writes are dropped with a diagnostic
    ReadOnly,
    // Reads see the power-on fill, writes are dropped silently
    WriteIgnored,
    // Reads return a fixed sentinel and storage is never touched
    Forbidden,
}

/// One entry of the declarative layout table. Start offsets are not part of the entry; they are
/// derived from the order and sizes of the entries when the layout is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpec {
    pub kind: RegionKind,
    pub size: usize,
    pub policy: AccessPolicy,
}

impl RegionSpec {
    pub const fn new(kind: RegionKind, size: usize, policy: AccessPolicy) -> Self {
        Self { kind, size, policy }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub start: u32,
    pub size: usize,
    pub policy: AccessPolicy,
}

impl Region {
    /// Exclusive end address.
    pub fn end(&self) -> u64 {
        u64::from(self.start) + self.size as u64
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.start && u64::from(address) < self.end()
    }
}

/// A resolved address: which region it falls in and where inside that region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub kind: RegionKind,
    pub policy: AccessPolicy,
    // Relative to the start of the region
    pub offset: usize,
    // Index into the backing buffer
    pub absolute: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("memory layout has no regions")]
    Empty,
    #[error("region {kind} has size 0")]
    ZeroSized { kind: RegionKind },
    #[error("region {kind} appears more than once in the layout")]
    Duplicate { kind: RegionKind },
    #[error("memory layout is missing the {kind} region")]
    MissingRegion { kind: RegionKind },
    #[error("register region must be at least {min} bytes, was {size}")]
    RegistersTooSmall { size: usize, min: usize },
    #[error("memory layout total size {total} does not fit in a 32-bit address space")]
    TooLarge { total: u64 },
}

const DMG_REGIONS: [RegionSpec; 9] = [
    RegionSpec::new(RegionKind::Cartridge, address::CARTRIDGE_SIZE, AccessPolicy::ReadOnly),
    RegionSpec::new(RegionKind::VRam, address::VRAM_SIZE, AccessPolicy::ReadWrite),
    RegionSpec::new(RegionKind::ExternalRam, address::EXTERNAL_RAM_SIZE, AccessPolicy::ReadWrite),
    RegionSpec::new(RegionKind::WorkingRam, address::WORKING_RAM_SIZE, AccessPolicy::ReadWrite),
    RegionSpec::new(RegionKind::Prohibited, address::PROHIBITED_SIZE, AccessPolicy::Forbidden),
    RegionSpec::new(RegionKind::Oam, address::OAM_SIZE, AccessPolicy::ReadWrite),
    RegionSpec::new(RegionKind::Unusable, address::UNUSABLE_SIZE, AccessPolicy::WriteIgnored),
    RegionSpec::new(RegionKind::IoRegisters, address::IO_REGISTERS_SIZE, AccessPolicy::ReadWrite),
    RegionSpec::new(RegionKind::Stack, address::STACK_SIZE, AccessPolicy::ReadWrite),
];

static DMG_LAYOUT: Lazy<MemoryLayout> = Lazy::new(|| {
    MemoryLayout::new(&DMG_REGIONS).expect("built-in DMG memory layout should always be valid")
});

/// The partitioning of the address space into regions. Regions are sorted by start address,
/// contiguous, and non-overlapping; this is checked once in [`MemoryLayout::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RegionSpec>", into = "Vec<RegionSpec>")]
pub struct MemoryLayout {
    regions: Vec<Region>,
    total_size: usize,
}

impl MemoryLayout {
    /// Build a layout from an ordered table of regions, deriving each region's start address
    /// from the sizes of the regions before it.
    pub fn new(specs: &[RegionSpec]) -> Result<Self, LayoutError> {
        if specs.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut regions: Vec<Region> = Vec::with_capacity(specs.len());
        let mut next_start: u64 = 0;
        for spec in specs {
            if spec.size == 0 {
                return Err(LayoutError::ZeroSized { kind: spec.kind });
            }

            if regions.iter().any(|region| region.kind == spec.kind) {
                return Err(LayoutError::Duplicate { kind: spec.kind });
            }

            let start: u32 = next_start
                .try_into()
                .map_err(|_err| LayoutError::TooLarge { total: next_start })?;
            regions.push(Region {
                kind: spec.kind,
                start,
                size: spec.size,
                policy: spec.policy,
            });

            next_start += spec.size as u64;
        }

        // The last valid address must itself be addressable
        if next_start > u64::from(u32::MAX) + 1 {
            return Err(LayoutError::TooLarge { total: next_start });
        }

        for required in [RegionKind::Cartridge, RegionKind::IoRegisters, RegionKind::Stack] {
            if !regions.iter().any(|region| region.kind == required) {
                return Err(LayoutError::MissingRegion { kind: required });
            }
        }

        let registers = regions
            .iter()
            .find(|region| region.kind == RegionKind::IoRegisters)
            .map_or(0, |region| region.size);
        if registers < address::MIN_IO_REGISTERS_SIZE {
            return Err(LayoutError::RegistersTooSmall {
                size: registers,
                min: address::MIN_IO_REGISTERS_SIZE,
            });
        }

        let total_size = next_start as usize;
        for region in &regions {
            log::debug!(
                "region {:<12} {:05X}..{:05X} ({} bytes, {:?})",
                region.kind,
                region.start,
                region.end(),
                region.size,
                region.policy
            );
        }

        Ok(Self {
            regions,
            total_size,
        })
    }

    /// The Game Boy (DMG) memory map.
    pub fn dmg() -> Self {
        DMG_LAYOUT.clone()
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.iter().find(|region| region.kind == kind)
    }

    /// Map an address to its region and region-relative offset. Addresses past the end of the
    /// layout are an error; they never wrap around.
    pub fn resolve(&self, address: u32) -> Result<ResolvedAddress, MemoryError> {
        if address as usize >= self.total_size {
            return Err(MemoryError::OutOfRange {
                address,
                size: self.total_size,
            });
        }

        // Regions are sorted and start at 0, so this is always at least 1
        let idx = self.regions.partition_point(|region| region.start <= address) - 1;
        let region = &self.regions[idx];

        Ok(ResolvedAddress {
            kind: region.kind,
            policy: region.policy,
            offset: (address - region.start) as usize,
            absolute: address as usize,
        })
    }

    fn specs(&self) -> Vec<RegionSpec> {
        self.regions
            .iter()
            .map(|region| RegionSpec::new(region.kind, region.size, region.policy))
            .collect()
    }
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self::dmg()
    }
}

impl TryFrom<Vec<RegionSpec>> for MemoryLayout {
    type Error = LayoutError;

    fn try_from(value: Vec<RegionSpec>) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<MemoryLayout> for Vec<RegionSpec> {
    fn from(value: MemoryLayout) -> Self {
        value.specs()
    }
}

impl std::fmt::Display for MemoryLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for region in &self.regions {
            writeln!(
                f,
                "{:<12} {:04X}-{:04X} {:?}",
                region.kind,
                region.start,
                region.end() - 1,
                region.policy
            )?;
        }

        Ok(())
    }
}
