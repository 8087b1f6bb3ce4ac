//! Operator commands and the outbound mode-control frame

use crate::error::ConfigError;

/// Marker shown in the status line for replay files
pub const READ_ONLY_INDICATOR: &str = "RO";
pub const PAUSED_INDICATOR: &str = "P";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    TogglePause,
    SelectMode(OperatingMode),
}

/// Display/operating mode of the remote interface (1, 2 or 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingMode(u8);

impl OperatingMode {
    pub fn new(mode: u8) -> Result<Self, ConfigError> {
        if (1..=3).contains(&mode) {
            Ok(Self(mode))
        } else {
            Err(ConfigError::InvalidValue(format!(
                "operating mode must be 1-3, got {}",
                mode
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Fixed 7-byte control frame, mode in position 2
    pub fn control_frame(&self) -> [u8; 7] {
        [0x03, 0x01, self.0, 0x00, 0x00, 0x00, 0x00]
    }

    pub fn indicator(&self) -> String {
        self.0.to_string()
    }
}

/// Short status markers shown in the dashboard footer
///
/// Toggling a marker adds it when absent and removes it when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    indicators: Vec<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, indicator: &str) {
        if let Some(pos) = self.indicators.iter().position(|i| i == indicator) {
            self.indicators.remove(pos);
        } else {
            self.indicators.push(indicator.to_string());
        }
    }

    pub fn set(&mut self, indicator: &str, present: bool) {
        if self.contains(indicator) != present {
            self.toggle(indicator);
        }
    }

    pub fn contains(&self, indicator: &str) -> bool {
        self.indicators.iter().any(|i| i == indicator)
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_frame() {
        let mode = OperatingMode::new(2).unwrap();
        assert_eq!(mode.control_frame(), [0x03, 0x01, 0x02, 0, 0, 0, 0]);
        assert_eq!(mode.indicator(), "2");
    }

    #[test]
    fn test_mode_range() {
        assert!(OperatingMode::new(0).is_err());
        assert!(OperatingMode::new(4).is_err());
        assert!(OperatingMode::new(3).is_ok());
    }

    #[test]
    fn test_status_line_toggles() {
        let mut status = StatusLine::new();
        status.toggle(READ_ONLY_INDICATOR);
        status.toggle("1");
        assert_eq!(status.indicators(), ["RO".to_string(), "1".to_string()]);

        status.toggle("1");
        assert_eq!(status.indicators(), ["RO".to_string()]);

        status.set(PAUSED_INDICATOR, true);
        status.set(PAUSED_INDICATOR, true);
        assert_eq!(status.indicators().len(), 2);
        status.set(PAUSED_INDICATOR, false);
        assert!(!status.contains(PAUSED_INDICATOR));
    }
}
