//! Shopper-facing configuration: the options a bind pass reads.
//!
//! A [`Configuration`] is a plain value. Every edit goes through
//! [`set_option`], which hands back a new value and leaves the old one intact,
//! so anything still holding a previous snapshot can compare against it.

pub mod serialization;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid color {0:?}: expected #rrggbb")]
    InvalidColor(String),
    #[error("invalid fletch count {0:?}: expected 3 or 4")]
    InvalidFletchCount(String),
    #[error("invalid boolean {0:?}")]
    InvalidBool(String),
    #[error("unknown option field {0:?}")]
    UnknownField(String),
    #[error("malformed option {0:?}: expected field=value")]
    Malformed(String),
}

/// 8-bit sRGB color. Serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear-space components for a material base color.
    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum FletchCount {
    #[default]
    Three,
    Four,
}

impl FletchCount {
    /// Label used in the cart payload.
    pub fn label(self) -> &'static str {
        match self {
            FletchCount::Three => "3-fletch",
            FletchCount::Four => "4-fletch",
        }
    }
}

impl FromStr for FletchCount {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "3" | "three" | "3-fletch" => Ok(FletchCount::Three),
            "4" | "four" | "4-fletch" => Ok(FletchCount::Four),
            other => Err(ConfigError::InvalidFletchCount(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Configuration {
    pub fletch_count: FletchCount,
    pub primary_vane_color: Rgb,
    pub secondary_vane_color: Rgb,
    pub nock_color: Rgb,
    pub wrap_color: Rgb,
    /// Reserved for an exploded assembly view; bind ignores it.
    pub exploded: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            fletch_count: FletchCount::Three,
            primary_vane_color: Rgb::new(0xff, 0x6a, 0x00),
            secondary_vane_color: Rgb::new(0xff, 0xff, 0xff),
            nock_color: Rgb::new(0x39, 0xff, 0x14),
            wrap_color: Rgb::new(0x11, 0x11, 0x11),
            exploded: false,
        }
    }
}

/// A single-field edit, as produced by a UI control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOption {
    FletchCount(FletchCount),
    PrimaryVaneColor(Rgb),
    SecondaryVaneColor(Rgb),
    NockColor(Rgb),
    WrapColor(Rgb),
    Exploded(bool),
}

impl ConfigOption {
    pub fn field_name(&self) -> &'static str {
        match self {
            ConfigOption::FletchCount(_) => "fletch",
            ConfigOption::PrimaryVaneColor(_) => "vane_primary",
            ConfigOption::SecondaryVaneColor(_) => "vane_secondary",
            ConfigOption::NockColor(_) => "nock",
            ConfigOption::WrapColor(_) => "wrap",
            ConfigOption::Exploded(_) => "exploded",
        }
    }
}

/// Parses `field=value`, e.g. `nock=#ff0000` or `fletch=4`.
impl FromStr for ConfigOption {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::Malformed(s.to_string()))?;
        let value = value.trim();
        match field.trim() {
            "fletch" => Ok(ConfigOption::FletchCount(value.parse()?)),
            "vane_primary" => Ok(ConfigOption::PrimaryVaneColor(value.parse()?)),
            "vane_secondary" => Ok(ConfigOption::SecondaryVaneColor(value.parse()?)),
            "nock" => Ok(ConfigOption::NockColor(value.parse()?)),
            "wrap" => Ok(ConfigOption::WrapColor(value.parse()?)),
            "exploded" => match value {
                "true" | "1" | "on" => Ok(ConfigOption::Exploded(true)),
                "false" | "0" | "off" => Ok(ConfigOption::Exploded(false)),
                other => Err(ConfigError::InvalidBool(other.to_string())),
            },
            other => Err(ConfigError::UnknownField(other.to_string())),
        }
    }
}

/// Returns a copy of `config` with exactly one field replaced.
pub fn set_option(config: &Configuration, option: ConfigOption) -> Configuration {
    let mut next = *config;
    match option {
        ConfigOption::FletchCount(value) => next.fletch_count = value,
        ConfigOption::PrimaryVaneColor(value) => next.primary_vane_color = value,
        ConfigOption::SecondaryVaneColor(value) => next.secondary_vane_color = value,
        ConfigOption::NockColor(value) => next.nock_color = value,
        ConfigOption::WrapColor(value) => next.wrap_color = value,
        ConfigOption::Exploded(value) => next.exploded = value,
    }
    next
}

/// Holds the session's current configuration snapshot.
///
/// Snapshots are shared as `Rc` so a consumer can keep the previous one for
/// comparison; an update always installs a fresh allocation.
pub struct ConfigStore {
    current: Rc<Configuration>,
    revision: u64,
}

impl ConfigStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            current: Rc::new(initial),
            revision: 0,
        }
    }

    pub fn current(&self) -> Rc<Configuration> {
        Rc::clone(&self.current)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_option(&mut self, option: ConfigOption) -> Rc<Configuration> {
        let next = set_option(&self.current, option);
        log::debug!("Option {} set", option.field_name());
        self.install(next)
    }

    pub fn replace(&mut self, config: Configuration) -> Rc<Configuration> {
        self.install(config)
    }

    fn install(&mut self, config: Configuration) -> Rc<Configuration> {
        self.current = Rc::new(config);
        self.revision = self.revision.wrapping_add(1);
        self.current()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}
