use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("timer rate for clock select {clock_select} must be nonzero")]
    ZeroTimerRate { clock_select: usize },
    #[error("divider period must be nonzero")]
    ZeroDividerPeriod,
}

/// Which logic level on a selector line selects its button group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectPolarity {
    // A set selector bit selects the group
    #[default]
    ActiveHigh,
    // A cleared selector bit selects the group, as on DMG hardware
    ActiveLow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Number of base clock cycles per timer counter increment, indexed by the clock select bits
    /// of the timer control register.
    #[serde(default = "default_timer_rates")]
    pub rates: [u32; 4],

    /// Number of base clock cycles per divider increment.
    #[serde(default = "default_divider_period")]
    pub divider_period: u32,
}

fn default_timer_rates() -> [u32; 4] {
    [1024, 16, 64, 256]
}

fn default_divider_period() -> u32 {
    256
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            rates: default_timer_rates(),
            divider_period: default_divider_period(),
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(clock_select) = self.rates.iter().position(|&rate| rate == 0) {
            return Err(ConfigError::ZeroTimerRate { clock_select });
        }

        if self.divider_period == 0 {
            return Err(ConfigError::ZeroDividerPeriod);
        }

        Ok(())
    }

    pub fn rate(&self, clock_select: u8) -> u32 {
        self.rates[usize::from(clock_select & 0x03)]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub select_polarity: SelectPolarity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub input: InputConfig,
}

impl EmulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timer.validate()
    }
}

impl std::fmt::Display for EmulatorConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timer_rates={:?}, divider_period={}, select_polarity={:?}",
            self.timer.rates, self.timer.divider_period, self.input.select_polarity
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub gb_file_path: String,
    pub emulator_config: EmulatorConfig,
}

impl std::fmt::Display for RunConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "gb_file_path: {}", self.gb_file_path)?;
        writeln!(f, "emulator_config: {}", self.emulator_config)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rates() {
        let config = TimerConfig::default();

        assert_eq!(1024, config.rate(0x00));
        assert_eq!(16, config.rate(0x01));
        assert_eq!(64, config.rate(0x02));
        assert_eq!(256, config.rate(0x03));
        // Only the low two bits select the rate
        assert_eq!(16, config.rate(0xFD));
        assert_eq!(Ok(()), config.validate());
    }

    #[test]
    fn zero_rates_are_rejected() {
        let config = TimerConfig {
            rates: [1024, 16, 0, 256],
            divider_period: 256,
        };
        assert_eq!(Err(ConfigError::ZeroTimerRate { clock_select: 2 }), config.validate());

        let config = TimerConfig {
            rates: default_timer_rates(),
            divider_period: 0,
        };
        assert_eq!(Err(ConfigError::ZeroDividerPeriod), config.validate());
    }

    #[test]
    fn selectors_default_to_active_high() {
        assert_eq!(SelectPolarity::ActiveHigh, SelectPolarity::default());
        assert_eq!(SelectPolarity::ActiveHigh, EmulatorConfig::default().input.select_polarity);
    }
}
