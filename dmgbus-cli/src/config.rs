use anyhow::Context;
use dmgbus_core::EmulatorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub emulator: EmulatorConfig,

    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

fn default_frame_delay_ms() -> u64 {
    2000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            emulator: EmulatorConfig::default(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading TOML config file from '{path:?}'"))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("error parsing config from TOML file at '{path:?}'"))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmgbus_core::SelectPolarity;

    #[test]
    fn empty_file_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(CliConfig::default(), config);
    }

    #[test]
    fn partial_overrides() {
        let config: CliConfig = toml::from_str(
            r#"
            frame_delay_ms = 16

            [emulator.timer]
            rates = [512, 8, 32, 128]

            [emulator.input]
            select_polarity = "ActiveLow"
            "#,
        )
        .unwrap();

        assert_eq!(16, config.frame_delay_ms);
        assert_eq!([512, 8, 32, 128], config.emulator.timer.rates);
        assert_eq!(256, config.emulator.timer.divider_period);
        assert_eq!(SelectPolarity::ActiveLow, config.emulator.input.select_polarity);
    }
}
