//! Tunable constants of the hand model and the assignment engine.
//!
//! Defaults reproduce the calibrated open-palm proportions. A configuration can
//! be loaded from JSON; any field left out keeps its default.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default direction and palm-relative length of one finger class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerSpec {
    /// Angle in degrees, measured counter-clockwise from the +x axis with the
    /// usual math orientation. Negated before use since image y grows down.
    pub angle_degrees: f64,
    /// Finger length (palm base to tip) as a multiple of palm height.
    pub length_ratio: f64,
}

impl FingerSpec {
    pub const fn new(angle_degrees: f64, length_ratio: f64) -> Self {
        Self {
            angle_degrees,
            length_ratio,
        }
    }

    /// The image-space ray angle in radians.
    pub fn theta(&self) -> f64 {
        (-self.angle_degrees).to_radians()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.angle_degrees.is_finite() {
            return Err(Error::InvalidConfig(format!("{name}: angle must be finite")));
        }
        if !(self.length_ratio.is_finite() && self.length_ratio > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "{name}: length ratio must be positive, got {}",
                self.length_ratio
            )));
        }
        Ok(())
    }
}

/// Five-finger open palm seen from the front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PalmarConfig {
    /// Palm width as a fraction of palm height.
    pub width_ratio: f64,
    /// Half-thickness of a finger box in pixels.
    pub finger_width: f64,
    pub pinky: FingerSpec,
    pub ring: FingerSpec,
    pub middle: FingerSpec,
    pub index: FingerSpec,
    pub thumb: FingerSpec,
}

impl Default for PalmarConfig {
    fn default() -> Self {
        Self {
            width_ratio: 0.90,
            finger_width: 8.0,
            pinky: FingerSpec::new(119.0, 1.47),
            ring: FingerSpec::new(103.0, 1.77),
            middle: FingerSpec::new(90.0, 1.88),
            index: FingerSpec::new(75.0, 1.75),
            thumb: FingerSpec::new(28.0, 1.13),
        }
    }
}

/// Hand seen edge-on: the four fingers collapse into one element plus the thumb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideConfig {
    pub width_ratio: f64,
    pub finger_width: f64,
    pub finger: FingerSpec,
    pub thumb: FingerSpec,
}

impl Default for SideConfig {
    fn default() -> Self {
        Self {
            width_ratio: 0.31,
            finger_width: 5.0,
            finger: FingerSpec::new(87.0, 1.81),
            thumb: FingerSpec::new(45.0, 0.63),
        }
    }
}

/// All recognized tuning options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    pub palmar: PalmarConfig,
    pub side: SideConfig,
    /// Candidates farther than this from a hypothesis tip are ignored.
    pub search_radius: f64,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            palmar: PalmarConfig::default(),
            side: SideConfig::default(),
            search_radius: 15.0,
        }
    }
}

impl HandConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        positive("palmar.width_ratio", self.palmar.width_ratio)?;
        positive("palmar.finger_width", self.palmar.finger_width)?;
        self.palmar.pinky.validate("palmar.pinky")?;
        self.palmar.ring.validate("palmar.ring")?;
        self.palmar.middle.validate("palmar.middle")?;
        self.palmar.index.validate("palmar.index")?;
        self.palmar.thumb.validate("palmar.thumb")?;

        positive("side.width_ratio", self.side.width_ratio)?;
        positive("side.finger_width", self.side.finger_width)?;
        self.side.finger.validate("side.finger")?;
        self.side.thumb.validate("side.thumb")?;

        positive("search_radius", self.search_radius)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HandConfig::default();
        config.validate().unwrap();
        assert_eq!(config.search_radius, 15.0);
        assert_eq!(config.palmar.middle, FingerSpec::new(90.0, 1.88));
        assert_eq!(config.side.thumb, FingerSpec::new(45.0, 0.63));
    }

    #[test]
    fn theta_points_up() {
        let theta = FingerSpec::new(90.0, 1.0).theta();
        assert!(theta.sin() < -0.999);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: HandConfig =
            serde_json::from_str(r#"{ "search_radius": 20.0, "palmar": { "finger_width": 6.0 } }"#)
                .unwrap();
        assert_eq!(config.search_radius, 20.0);
        assert_eq!(config.palmar.finger_width, 6.0);
        assert_eq!(config.palmar.width_ratio, 0.90);
        assert_eq!(config.side, SideConfig::default());
    }

    #[test]
    fn rejects_non_positive_radius() {
        let config = HandConfig {
            search_radius: 0.0,
            ..HandConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_length_ratio() {
        let mut config = HandConfig::default();
        config.palmar.ring.length_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn save_and_load_config() {
        let mut config = HandConfig::default();
        config.palmar.index = FingerSpec::new(70.0, 1.7);

        let temp_path = std::env::temp_dir().join("palmtips_test_config.json");
        config.save(&temp_path).unwrap();

        let loaded = HandConfig::load(&temp_path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_file(temp_path).ok();
    }
}
