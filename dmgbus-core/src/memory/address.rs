//
// Cartridge header addresses
//

pub const ENTRY_POINT: u32 = 0x0100;
pub const TITLE_START: u32 = 0x0134;
pub const TITLE_LEN: usize = 16;
pub const PROGRAM_START: u32 = 0x0150;

//
// Default address space boundaries
//

pub const CARTRIDGE_START: u32 = 0x0000;
pub const CARTRIDGE_SIZE: usize = 0x8000;

pub const VRAM_START: u32 = 0x8000;
pub const VRAM_SIZE: usize = 0x2000;

pub const EXTERNAL_RAM_START: u32 = 0xA000;
pub const EXTERNAL_RAM_SIZE: usize = 0x2000;

pub const WORKING_RAM_START: u32 = 0xC000;
pub const WORKING_RAM_SIZE: usize = 0x2000;

pub const PROHIBITED_START: u32 = 0xE000;
pub const PROHIBITED_SIZE: usize = 0x1E00;

pub const OAM_START: u32 = 0xFE00;
pub const OAM_SIZE: usize = 0xA0;

pub const UNUSABLE_START: u32 = 0xFEA0;
pub const UNUSABLE_SIZE: usize = 0x60;

pub const IO_REGISTERS_START: u32 = 0xFF00;
pub const IO_REGISTERS_SIZE: usize = 0x80;

pub const STACK_START: u32 = 0xFF80;
pub const STACK_SIZE: usize = 0x80;

pub const TOTAL_SIZE: usize = 0x10000;

//
// I/O register offsets, relative to the start of the register region
//

// Joypad selector
pub const JOYP_OFFSET: usize = 0x00;

// Divider
pub const DIV_OFFSET: usize = 0x04;

// Timer counter
pub const TIMA_OFFSET: usize = 0x05;

// Timer modulo
pub const TMA_OFFSET: usize = 0x06;

// Timer control
pub const TAC_OFFSET: usize = 0x07;

// Interrupt request flags
pub const IF_OFFSET: usize = 0x0F;

// The register region must at least cover every offset above
pub const MIN_IO_REGISTERS_SIZE: usize = 0x10;

// Returned by reads from forbidden regions
pub const FORBIDDEN_READ_VALUE: u8 = 0x00;
