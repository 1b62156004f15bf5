use serde::{ Deserialize, Serialize };

use crate::error::ConfigError;

/// Inclusive range of keys a controller accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: i32,
    pub max: i32
}

impl ValueRange {
    pub fn new(min: i32, max: i32) -> Result<Self, ConfigError> {
        match min <= max {
            true => Ok(Self { min, max }),
            false => Err(ConfigError::EmptyRange { min, max })
        }
    }
    pub fn contains(&self, value: i32) -> bool { self.min <= value && value <= self.max }
}

impl Default for ValueRange {
    fn default() -> Self { Self { min: i32::MIN, max: i32::MAX } }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub value_range: ValueRange,
    /// Log every emitted snapshot and rebalancing case at `trace` level.
    pub trace_steps: bool
}

impl TreeConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        // re-validate, serde does not go through ValueRange::new
        ValueRange::new(config.value_range.min, config.value_range.max)?;
        Ok(config)
    }
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
pub mod tests {
    use super::{ TreeConfig, ValueRange };
    use crate::error::ConfigError;
    use std::error::Error;

    type TestReturn = Result<(), Box<dyn Error>>;

    #[test]
    pub fn defaults_accept_everything() -> TestReturn {
        let config = TreeConfig::default();
        assert!(config.value_range.contains(i32::MIN));
        assert!(config.value_range.contains(i32::MAX));
        assert!(!config.trace_steps);
        Ok(())
    }

    #[test]
    pub fn partial_json() -> TestReturn {
        let config = TreeConfig::from_json(r#"{ "value_range": { "min": -99, "max": 999 } }"#)?;
        assert_eq!(config.value_range, ValueRange::new(-99, 999)?);
        assert!(!config.trace_steps);
        let again = TreeConfig::from_json(&config.to_json()?)?;
        assert_eq!(again, config);
        Ok(())
    }

    #[test]
    pub fn rejects_bad_input() -> TestReturn {
        assert!(matches!(TreeConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            TreeConfig::from_json(r#"{ "value_range": { "min": 5, "max": 1 } }"#),
            Err(ConfigError::EmptyRange { min: 5, max: 1 })
        ));
        Ok(())
    }
}
