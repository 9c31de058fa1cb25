use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::GalleryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GalleryMode {
    Hexbin,
    Ratio,
}

impl GalleryMode {
    pub const ALL: [GalleryMode; 2] = [GalleryMode::Hexbin, GalleryMode::Ratio];

    pub fn as_str(self) -> &'static str {
        match self {
            GalleryMode::Hexbin => "hexbin",
            GalleryMode::Ratio => "ratio",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GalleryMode::Hexbin => "Defaulters vs Non Defaulters",
            GalleryMode::Ratio => "Islands of Stability",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            GalleryMode::Hexbin => ".png",
            GalleryMode::Ratio => "_ratio.png",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            GalleryMode::Hexbin => GalleryMode::Ratio,
            GalleryMode::Ratio => GalleryMode::Hexbin,
        }
    }
}

impl fmt::Display for GalleryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GalleryMode {
    type Err = GalleryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hexbin" => Ok(GalleryMode::Hexbin),
            "ratio" => Ok(GalleryMode::Ratio),
            _ => Err(GalleryError::InvalidMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub struct Threshold(u8);

impl Threshold {
    pub const MIN: Threshold = Threshold(0);
    pub const MAX: Threshold = Threshold(9);

    pub fn new(value: u8) -> Result<Self, GalleryError> {
        if value > Self::MAX.0 {
            return Err(GalleryError::InvalidThreshold(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn saturating_inc(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX.0))
    }

    pub fn saturating_dec(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl From<Threshold> for u8 {
    fn from(value: Threshold) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Threshold {
    type Error = GalleryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Threshold {
    type Err = GalleryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<u8>()
            .map_err(|_| GalleryError::InvalidThreshold(value.to_string()))?;
        Self::new(parsed)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_threshold_valid() {
        let threshold: Threshold = " 7 ".parse().unwrap();
        assert_eq!(threshold.value(), 7);
    }

    #[test]
    fn parse_threshold_out_of_range() {
        let err = "10".parse::<Threshold>().unwrap_err();
        assert_matches!(err, GalleryError::InvalidThreshold(_));
        let err = "-1".parse::<Threshold>().unwrap_err();
        assert_matches!(err, GalleryError::InvalidThreshold(_));
    }

    #[test]
    fn threshold_steps_stay_in_range() {
        assert_eq!(Threshold::MAX.saturating_inc(), Threshold::MAX);
        assert_eq!(Threshold::MIN.saturating_dec(), Threshold::MIN);
        assert_eq!(Threshold::MIN.saturating_inc().value(), 1);
    }

    #[test]
    fn parse_mode() {
        let mode: GalleryMode = "Ratio".parse().unwrap();
        assert_eq!(mode, GalleryMode::Ratio);
        assert_matches!(
            "scatter".parse::<GalleryMode>(),
            Err(GalleryError::InvalidMode(_))
        );
        assert_eq!(GalleryMode::Hexbin.toggle(), GalleryMode::Ratio);
    }
}
