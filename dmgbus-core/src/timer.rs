use crate::config::TimerConfig;
use crate::memory::ioregisters::{InterruptType, IoRegister, IoRegisters};
use serde::{Deserialize, Serialize};

/// Unused TAC bits, which always read back as 1.
pub const TAC_UNUSED_BITS: u8 = 0xF8;

const TAC_ENABLE_BIT: u8 = 0x04;
const TAC_CLOCK_SELECT_MASK: u8 = 0x03;

/// Sub-increment progress of the divider and the timer counter, in base clock cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCounter {
    divider_cycles: u64,
    timer_cycles: u64,
}

impl TimerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes to DIV clear the prescaler along with the register itself.
    pub fn reset_divider(&mut self) {
        self.divider_cycles = 0;
    }

    /// Carry timer progress over to a new clock select, so that a switch to a faster rate
    /// never produces more than one increment's worth of pending cycles.
    pub fn change_timer_rate(&mut self, rate: u32) {
        self.timer_cycles %= u64::from(rate);
    }
}

/// A convenience view of the TAC register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerControl(pub u8);

impl TimerControl {
    pub fn enabled(self) -> bool {
        self.0 & TAC_ENABLE_BIT != 0
    }

    pub fn clock_select(self) -> u8 {
        self.0 & TAC_CLOCK_SELECT_MASK
    }
}

/// Advance DIV and TIMA by the given number of base clock cycles. Returns how many times TIMA
/// overflowed, each of which reloaded TIMA from TMA and requested a timer interrupt.
pub fn update_timer_registers(
    io_registers: &mut IoRegisters<'_>,
    counter: &mut TimerCounter,
    config: &TimerConfig,
    cycles: u32,
) -> u32 {
    counter.divider_cycles += u64::from(cycles);
    let div_diff = counter.divider_cycles / u64::from(config.divider_period);
    counter.divider_cycles %= u64::from(config.divider_period);
    if div_diff != 0 {
        // DIV wraps freely, it never raises an interrupt
        let old_div = io_registers.read_register(IoRegister::DIV);
        io_registers.write_register(IoRegister::DIV, old_div.wrapping_add(div_diff as u8));
    }

    let timer_control = TimerControl(io_registers.read_register(IoRegister::TAC));
    if !timer_control.enabled() {
        // Progress toward the next TIMA increment is frozen while the timer is disabled
        return 0;
    }

    let rate = u64::from(config.rate(timer_control.clock_select()));
    counter.timer_cycles += u64::from(cycles);
    let increments = counter.timer_cycles / rate;
    counter.timer_cycles %= rate;
    if increments == 0 {
        return 0;
    }

    let old_tima = u64::from(io_registers.read_register(IoRegister::TIMA));
    let to_first_overflow = 0x100 - old_tima;
    if increments < to_first_overflow {
        io_registers.write_register(IoRegister::TIMA, (old_tima + increments) as u8);
        return 0;
    }

    // After the first overflow TIMA cycles through TMA..=0xFF
    let timer_modulo = io_registers.read_register(IoRegister::TMA);
    let reload_period = 0x100 - u64::from(timer_modulo);
    let after_reload = increments - to_first_overflow;
    let overflows = 1 + after_reload / reload_period;
    let new_tima = u64::from(timer_modulo) + after_reload % reload_period;

    io_registers.write_register(IoRegister::TIMA, new_tima as u8);
    io_registers.interrupt_flags().set(InterruptType::Timer);

    log::trace!("TIMA overflowed {overflows} time(s), reloaded from TMA={timer_modulo:02X}");

    // Bounded by the cycle count, since every rate is at least 1
    u32::try_from(overflows).unwrap_or(u32::MAX)
}
