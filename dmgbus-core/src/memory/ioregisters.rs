use crate::config::{EmulatorConfig, SelectPolarity};
use crate::input::{self, ButtonLines};
use crate::memory::address;
use crate::timer::{self, TimerControl, TimerCounter, TAC_UNUSED_BITS};
use serde::{Deserialize, Serialize};

/// The hardware registers the core itself reads or writes.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoRegister {
    JOYP,
    DIV,
    TIMA,
    TMA,
    TAC,
    IF,
}

impl IoRegister {
    /// Return the offset of this register relative to the start of the register region.
    pub fn to_offset(self) -> usize {
        match self {
            Self::JOYP => address::JOYP_OFFSET,
            Self::DIV => address::DIV_OFFSET,
            Self::TIMA => address::TIMA_OFFSET,
            Self::TMA => address::TMA_OFFSET,
            Self::TAC => address::TAC_OFFSET,
            Self::IF => address::IF_OFFSET,
        }
    }
}

/// How CPU reads and writes at a register offset behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Plain,
    InputSelect,
    TimerCounter,
    TimerModulo,
    TimerControl,
    Divider,
}

impl RegisterKind {
    /// Offsets without special behavior are plain storage.
    pub fn from_offset(offset: usize) -> Self {
        match offset {
            address::JOYP_OFFSET => Self::InputSelect,
            address::DIV_OFFSET => Self::Divider,
            address::TIMA_OFFSET => Self::TimerCounter,
            address::TMA_OFFSET => Self::TimerModulo,
            address::TAC_OFFSET => Self::TimerControl,
            _ => Self::Plain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

/// A convenience view around the IF register.
pub struct InterruptFlags<'a>(&'a mut u8);

impl<'a> InterruptFlags<'a> {
    pub fn new(value: &'a mut u8) -> Self {
        Self(value)
    }

    /// Returns the highest priority requested + enabled interrupt, or None if no enabled interrupts
    /// have been requested.
    pub fn highest_priority_interrupt(&self, ie_value: u8) -> Option<InterruptType> {
        let masked_if = *self.0 & ie_value;
        [
            InterruptType::VBlank,
            InterruptType::LcdStatus,
            InterruptType::Timer,
            InterruptType::Serial,
            InterruptType::Joypad,
        ]
        .into_iter()
        .find(|interrupt_type| masked_if & interrupt_type.bit() != 0)
    }

    pub fn get(&self, interrupt_type: InterruptType) -> bool {
        *self.0 & interrupt_type.bit() != 0
    }

    /// Sets the bit for the given interrupt type.
    pub fn set(&mut self, interrupt_type: InterruptType) {
        *self.0 |= interrupt_type.bit();
    }

    /// Clears the bit for the given interrupt type.
    pub fn clear(&mut self, interrupt_type: InterruptType) {
        *self.0 &= !interrupt_type.bit();
    }
}

/// Raw access to the register region's backing bytes, bypassing every read/write side effect.
/// Only the timer and input code should go through this.
pub struct IoRegisters<'a> {
    contents: &'a mut [u8],
}

impl<'a> IoRegisters<'a> {
    pub fn new(contents: &'a mut [u8]) -> Self {
        Self { contents }
    }

    pub fn read_register(&self, register: IoRegister) -> u8 {
        self.contents[register.to_offset()]
    }

    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        self.contents[register.to_offset()] = value;
    }

    /// Obtain a read/write view around the IF register (interrupt request flags).
    pub fn interrupt_flags(&mut self) -> InterruptFlags<'_> {
        InterruptFlags(&mut self.contents[address::IF_OFFSET])
    }
}

/// The behavior layered on top of the register region: timer progress, live button lines, and
/// the configuration both depend on. The register bytes themselves live in the address space's
/// buffer and are passed in on every call, so identical state always produces identical answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBank {
    timer_counter: TimerCounter,
    button_lines: ButtonLines,
    config: EmulatorConfig,
}

impl RegisterBank {
    pub fn new(config: EmulatorConfig) -> Self {
        Self {
            timer_counter: TimerCounter::new(),
            button_lines: ButtonLines::default(),
            config,
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    fn select_polarity(&self) -> SelectPolarity {
        self.config.input.select_polarity
    }

    /// Read the register at the given offset as the CPU sees it.
    pub fn read(&self, contents: &[u8], offset: usize) -> u8 {
        let byte = contents[offset];
        match RegisterKind::from_offset(offset) {
            RegisterKind::InputSelect => {
                input::read_joyp(byte, self.button_lines, self.select_polarity())
            }
            RegisterKind::TimerControl => byte | TAC_UNUSED_BITS,
            RegisterKind::Plain
            | RegisterKind::TimerCounter
            | RegisterKind::TimerModulo
            | RegisterKind::Divider => byte,
        }
    }

    /// Write the register at the given offset as the CPU would.
    pub fn write(&mut self, contents: &mut [u8], offset: usize, value: u8) {
        match RegisterKind::from_offset(offset) {
            RegisterKind::InputSelect => {
                let old_joyp = self.read(contents, offset);
                contents[offset] = input::selector_bits(value);
                self.flag_joypad_interrupt(contents, old_joyp);
            }
            RegisterKind::Divider => {
                // All writes to DIV reset the value to 0
                contents[offset] = 0x00;
                self.timer_counter.reset_divider();
            }
            RegisterKind::TimerControl => {
                let old_select = TimerControl(contents[offset]).clock_select();
                let new_select = TimerControl(value).clock_select();
                if old_select != new_select {
                    self.timer_counter.change_timer_rate(self.config.timer.rate(new_select));
                }
                contents[offset] = value & !TAC_UNUSED_BITS;
            }
            RegisterKind::Plain | RegisterKind::TimerCounter | RegisterKind::TimerModulo => {
                contents[offset] = value;
            }
        }
    }

    /// Advance the timer by the given number of base clock cycles, returning how many times the
    /// timer counter overflowed.
    pub fn tick(&mut self, contents: &mut [u8], cycles: u32) -> u32 {
        timer::update_timer_registers(
            &mut IoRegisters::new(contents),
            &mut self.timer_counter,
            &self.config.timer,
            cycles,
        )
    }

    /// Replace the live button lines, requesting a joypad interrupt if a selected line fell.
    pub fn set_button_lines(&mut self, contents: &mut [u8], lines: ButtonLines) {
        let old_joyp = self.read(contents, address::JOYP_OFFSET);
        self.button_lines = lines;
        self.flag_joypad_interrupt(contents, old_joyp);
    }

    pub fn button_lines(&self) -> ButtonLines {
        self.button_lines
    }

    fn flag_joypad_interrupt(&self, contents: &mut [u8], old_joyp: u8) {
        let new_joyp = self.read(contents, address::JOYP_OFFSET);
        if input::should_flag_interrupt(old_joyp, new_joyp) {
            IoRegisters::new(contents).interrupt_flags().set(InterruptType::Joypad);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;

    fn empty_registers() -> Vec<u8> {
        vec![0; 0x80]
    }

    #[test]
    fn offsets_map_to_one_kind() {
        assert_eq!(RegisterKind::InputSelect, RegisterKind::from_offset(0x00));
        assert_eq!(RegisterKind::Divider, RegisterKind::from_offset(0x04));
        assert_eq!(RegisterKind::TimerCounter, RegisterKind::from_offset(0x05));
        assert_eq!(RegisterKind::TimerModulo, RegisterKind::from_offset(0x06));
        assert_eq!(RegisterKind::TimerControl, RegisterKind::from_offset(0x07));

        for offset in (0x01..=0x03).chain(0x08..0x80) {
            assert_eq!(RegisterKind::Plain, RegisterKind::from_offset(offset), "{offset:02X}");
        }
    }

    #[test]
    fn plain_storage() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        for offset in [0x01, 0x0F, 0x40, 0x7F] {
            bank.write(&mut contents, offset, 0x5A);
            assert_eq!(0x5A, bank.read(&contents, offset));
        }
    }

    #[test]
    fn div_write_clears() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        bank.tick(&mut contents, 256 * 5 + 200);
        assert_eq!(0x05, bank.read(&contents, address::DIV_OFFSET));

        for value in [0x00, 0x01, 0x7F, 0xFF] {
            bank.write(&mut contents, address::DIV_OFFSET, value);
            assert_eq!(0x00, bank.read(&contents, address::DIV_OFFSET));
        }

        // The prescaler was cleared too, so a full period is needed for the next increment
        bank.tick(&mut contents, 255);
        assert_eq!(0x00, bank.read(&contents, address::DIV_OFFSET));
        bank.tick(&mut contents, 1);
        assert_eq!(0x01, bank.read(&contents, address::DIV_OFFSET));
    }

    #[test]
    fn tac_mask() {
        // Bits 3-7 are unused and always read 1
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        assert_eq!(0xF8, bank.read(&contents, address::TAC_OFFSET));

        bank.write(&mut contents, address::TAC_OFFSET, 0x05);
        assert_eq!(0xFD, bank.read(&contents, address::TAC_OFFSET));

        bank.write(&mut contents, address::TAC_OFFSET, 0xFA);
        assert_eq!(0xFA, bank.read(&contents, address::TAC_OFFSET));
        assert_eq!(0x02, contents[address::TAC_OFFSET]);
    }

    #[test]
    fn tima_and_tma_are_plain_overwrites() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        bank.write(&mut contents, address::TIMA_OFFSET, 0xFF);
        bank.write(&mut contents, address::TMA_OFFSET, 0x10);
        assert_eq!(0xFF, bank.read(&contents, address::TIMA_OFFSET));
        assert_eq!(0x10, bank.read(&contents, address::TMA_OFFSET));
        // No reload happens on a direct write
        assert_eq!(0x00, contents[address::IF_OFFSET]);
    }

    #[test]
    fn tac_write_takes_effect_on_next_tick() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        bank.write(&mut contents, address::TAC_OFFSET, 0x05);
        bank.tick(&mut contents, 16);
        assert_eq!(0x01, bank.read(&contents, address::TIMA_OFFSET));

        bank.write(&mut contents, address::TAC_OFFSET, 0x06);
        bank.tick(&mut contents, 63);
        assert_eq!(0x01, bank.read(&contents, address::TIMA_OFFSET));
        bank.tick(&mut contents, 1);
        assert_eq!(0x02, bank.read(&contents, address::TIMA_OFFSET));
    }

    #[test]
    fn slow_to_fast_clock_switch() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        bank.write(&mut contents, address::TAC_OFFSET, 0x04);
        bank.tick(&mut contents, 1020);
        bank.write(&mut contents, address::TAC_OFFSET, 0x05);

        assert_eq!(0, bank.tick(&mut contents, 4));
        assert_eq!(0x01, bank.read(&contents, address::TIMA_OFFSET));

        bank.tick(&mut contents, 16);
        assert_eq!(0x02, bank.read(&contents, address::TIMA_OFFSET));
        assert_eq!(0x00, contents[address::IF_OFFSET]);
    }

    #[test]
    fn joyp_mask() {
        // Bits 6-7 are unusable and always read 1
        // Bits 4-5 are the only stored bits
        // Bits 0-3 come from the button lines, writes are ignored

        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        assert_eq!(0xCF, bank.read(&contents, address::JOYP_OFFSET));

        bank.write(&mut contents, address::JOYP_OFFSET, 0x0F);
        assert_eq!(0xCF, bank.read(&contents, address::JOYP_OFFSET));
        assert_eq!(0x00, contents[address::JOYP_OFFSET]);

        bank.write(&mut contents, address::JOYP_OFFSET, 0xFF);
        assert_eq!(0xFF, bank.read(&contents, address::JOYP_OFFSET));
        assert_eq!(0x30, contents[address::JOYP_OFFSET]);
    }

    #[test]
    fn joyp_multiplexes_selected_group() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        bank.set_button_lines(&mut contents, ButtonLines::new(0b1010, 0b0101));

        bank.write(&mut contents, address::JOYP_OFFSET, 0x10);
        assert_eq!(0xDA, bank.read(&contents, address::JOYP_OFFSET));

        bank.write(&mut contents, address::JOYP_OFFSET, 0x20);
        assert_eq!(0xE5, bank.read(&contents, address::JOYP_OFFSET));

        bank.write(&mut contents, address::JOYP_OFFSET, 0x00);
        assert_eq!(0xCF, bank.read(&contents, address::JOYP_OFFSET));
    }

    #[test]
    fn joyp_active_low_config() {
        let config = EmulatorConfig {
            input: InputConfig {
                select_polarity: SelectPolarity::ActiveLow,
            },
            ..EmulatorConfig::default()
        };
        let mut bank = RegisterBank::new(config);
        let mut contents = empty_registers();

        bank.set_button_lines(&mut contents, ButtonLines::new(0b1010, 0b0101));

        bank.write(&mut contents, address::JOYP_OFFSET, 0x20);
        assert_eq!(0xEA, bank.read(&contents, address::JOYP_OFFSET));
    }

    #[test]
    fn joypad_interrupt_on_press() {
        let mut bank = RegisterBank::new(EmulatorConfig::default());
        let mut contents = empty_registers();

        bank.write(&mut contents, address::JOYP_OFFSET, 0x10);
        assert_eq!(0x00, contents[address::IF_OFFSET]);

        // Pressing a button in the unselected group does nothing
        bank.set_button_lines(&mut contents, ButtonLines::new(0b1111, 0b1110));
        assert_eq!(0x00, contents[address::IF_OFFSET]);

        bank.set_button_lines(&mut contents, ButtonLines::new(0b0111, 0b1110));
        assert_eq!(0x10, contents[address::IF_OFFSET]);

        // Selecting a group with a held button also lowers a line
        contents[address::IF_OFFSET] = 0x00;
        bank.write(&mut contents, address::JOYP_OFFSET, 0x20);
        assert_eq!(0x10, contents[address::IF_OFFSET]);
    }

    #[test]
    fn interrupt_flags_priority() {
        let mut value = 0x00;
        let mut flags = InterruptFlags::new(&mut value);

        assert_eq!(None, flags.highest_priority_interrupt(0xFF));

        flags.set(InterruptType::Joypad);
        flags.set(InterruptType::Timer);
        assert_eq!(Some(InterruptType::Timer), flags.highest_priority_interrupt(0xFF));
        assert_eq!(Some(InterruptType::Joypad), flags.highest_priority_interrupt(0x10));
        assert_eq!(None, flags.highest_priority_interrupt(0x03));

        flags.clear(InterruptType::Timer);
        assert!(!flags.get(InterruptType::Timer));
        assert!(flags.get(InterruptType::Joypad));
        assert_eq!(0x10, value);
    }

    #[test]
    fn identical_state_answers_identically() {
        let mut first = RegisterBank::new(EmulatorConfig::default());
        let mut first_contents = empty_registers();

        for (offset, value) in [(0x07, 0x05), (0x06, 0x80), (0x00, 0x10), (0x22, 0x33)] {
            first.write(&mut first_contents, offset, value);
        }
        first.tick(&mut first_contents, 1000);

        let second = first.clone();
        let second_contents = first_contents.clone();
        assert_eq!(first, second);

        for offset in 0..0x80 {
            assert_eq!(first.read(&first_contents, offset), second.read(&second_contents, offset));
        }
    }
}
