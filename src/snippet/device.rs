//! Device layouts the preview can emulate

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Preview layout. Only the container width depends on the mode; the pixel
/// budgets of the snippet fields are the same on both.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    #[default]
    Desktop,
    Mobile,
}

impl DeviceMode {
    /// Width of the result card in CSS pixels.
    pub fn container_width(self) -> u32 {
        match self {
            DeviceMode::Desktop => 672,
            DeviceMode::Mobile => 384,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeviceMode::Desktop => "Desktop",
            DeviceMode::Mobile => "Mobile",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceMode::Desktop => "desktop",
            DeviceMode::Mobile => "mobile",
        })
    }
}

impl FromStr for DeviceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(DeviceMode::Desktop),
            "mobile" => Ok(DeviceMode::Mobile),
            other => Err(Error::Config(format!("unknown device mode '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_mode_parses_and_displays() {
        assert_eq!("Mobile".parse::<DeviceMode>().unwrap(), DeviceMode::Mobile);
        assert_eq!(DeviceMode::Desktop.to_string(), "desktop");
        assert!("tablet".parse::<DeviceMode>().is_err());
    }

    #[test]
    fn mobile_container_is_narrower() {
        assert!(DeviceMode::Mobile.container_width() < DeviceMode::Desktop.container_width());
    }
}
