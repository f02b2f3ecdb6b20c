//! Control layer between palette pickers and the configuration store.

use crate::config::{ConfigOption, Configuration, FletchCount, Rgb};
use crate::scene::binder::BindReport;
use crate::settings::{Palette, Swatch};
use std::fmt::Write;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UiError {
    #[error("no {slot} swatch named {name:?}")]
    UnknownSwatch { slot: &'static str, name: String },
    #[error("unknown control {0:?}")]
    UnknownControl(String),
    #[error("malformed pick {0:?}: expected control=swatch")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSlot {
    PrimaryVane,
    SecondaryVane,
    Nock,
    Wrap,
}

impl ColorSlot {
    fn label(self) -> &'static str {
        match self {
            ColorSlot::PrimaryVane => "vane_primary",
            ColorSlot::SecondaryVane => "vane_secondary",
            ColorSlot::Nock => "nock",
            ColorSlot::Wrap => "wrap",
        }
    }

    fn option(self, color: Rgb) -> ConfigOption {
        match self {
            ColorSlot::PrimaryVane => ConfigOption::PrimaryVaneColor(color),
            ColorSlot::SecondaryVane => ConfigOption::SecondaryVaneColor(color),
            ColorSlot::Nock => ConfigOption::NockColor(color),
            ColorSlot::Wrap => ConfigOption::WrapColor(color),
        }
    }
}

impl FromStr for ColorSlot {
    type Err = UiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vane_primary" => Ok(ColorSlot::PrimaryVane),
            "vane_secondary" => Ok(ColorSlot::SecondaryVane),
            "nock" => Ok(ColorSlot::Nock),
            "wrap" => Ok(ColorSlot::Wrap),
            other => Err(UiError::UnknownControl(other.to_string())),
        }
    }
}

pub struct ControlPanel {
    palette: Palette,
}

impl ControlPanel {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    fn swatches(&self, slot: ColorSlot) -> &[Swatch] {
        match slot {
            ColorSlot::PrimaryVane | ColorSlot::SecondaryVane => &self.palette.vane,
            ColorSlot::Nock => &self.palette.nock,
            ColorSlot::Wrap => &self.palette.wrap,
        }
    }

    /// Resolves a swatch pick (case-insensitive name) into an option.
    pub fn pick(&self, slot: ColorSlot, swatch: &str) -> Result<ConfigOption, UiError> {
        self.swatches(slot)
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(swatch.trim()))
            .map(|candidate| slot.option(candidate.color))
            .ok_or_else(|| UiError::UnknownSwatch {
                slot: slot.label(),
                name: swatch.to_string(),
            })
    }

    /// Parses `control=swatch`, e.g. `nock=Pink`.
    pub fn pick_str(&self, pick: &str) -> Result<ConfigOption, UiError> {
        let (control, swatch) = pick
            .split_once('=')
            .ok_or_else(|| UiError::Malformed(pick.to_string()))?;
        self.pick(control.parse()?, swatch)
    }

    pub fn fletch_toggle(&self, current: &Configuration) -> ConfigOption {
        ConfigOption::FletchCount(match current.fletch_count {
            FletchCount::Three => FletchCount::Four,
            FletchCount::Four => FletchCount::Three,
        })
    }

    /// Palette name for a color, if it is one of the slot's swatches.
    pub fn swatch_name(&self, slot: ColorSlot, color: Rgb) -> Option<&str> {
        self.swatches(slot)
            .iter()
            .find(|swatch| swatch.color == color)
            .map(|swatch| swatch.name.as_str())
    }

    pub fn option_listing(&self) -> String {
        let mut out = String::from("fletch: 3, 4\n");
        for slot in [
            ColorSlot::PrimaryVane,
            ColorSlot::SecondaryVane,
            ColorSlot::Nock,
            ColorSlot::Wrap,
        ] {
            let names: Vec<String> = self
                .swatches(slot)
                .iter()
                .map(|swatch| format!("{} ({})", swatch.name, swatch.color))
                .collect();
            let _ = writeln!(out, "{}: {}", slot.label(), names.join(", "));
        }
        out
    }

    pub fn summary(&self, config: &Configuration, report: Option<&BindReport>) -> String {
        let describe = |slot: ColorSlot, color: Rgb| match self.swatch_name(slot, color) {
            Some(name) => format!("{name} ({color})"),
            None => color.to_hex(),
        };
        let mut summary = format!(
            "{} | vanes {} / {} | nock {} | wrap {}",
            config.fletch_count.label(),
            describe(ColorSlot::PrimaryVane, config.primary_vane_color),
            describe(ColorSlot::SecondaryVane, config.secondary_vane_color),
            describe(ColorSlot::Nock, config.nock_color),
            describe(ColorSlot::Wrap, config.wrap_color),
        );
        if let Some(report) = report {
            let _ = write!(
                summary,
                "\nrecolored {} vane, {} nock, {} wrap meshes",
                report.vane_meshes, report.nock_meshes, report.wrap_meshes
            );
            if !report.missing.is_empty() {
                let _ = write!(summary, "\nnot in asset: {}", report.missing.join(", "));
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ControlPanel {
        ControlPanel::new(Palette::default())
    }

    #[test]
    fn picks_resolve_against_the_right_palette() {
        let panel = panel();
        assert_eq!(
            panel.pick_str("nock=pink"),
            Ok(ConfigOption::NockColor(Rgb::new(0xff, 0x3e, 0xa5)))
        );
        assert_eq!(
            panel.pick(ColorSlot::SecondaryVane, "White"),
            Ok(ConfigOption::SecondaryVaneColor(Rgb::new(0xff, 0xff, 0xff)))
        );
        assert!(matches!(
            panel.pick(ColorSlot::Nock, "Camo Green"),
            Err(UiError::UnknownSwatch { slot: "nock", .. })
        ));
        assert!(matches!(
            panel.pick_str("shaft=Black"),
            Err(UiError::UnknownControl(_))
        ));
    }

    #[test]
    fn toggle_flips_fletch_count() {
        let panel = panel();
        assert_eq!(
            panel.fletch_toggle(&Configuration::default()),
            ConfigOption::FletchCount(FletchCount::Four)
        );
    }

    #[test]
    fn summary_names_known_swatches_and_missing_groups() {
        let panel = panel();
        let report = BindReport {
            missing: vec!["Nock".to_string()],
            ..BindReport::default()
        };
        let text = panel.summary(&Configuration::default(), Some(&report));
        assert!(text.starts_with("3-fletch | vanes Blaze Orange (#ff6a00) / White (#ffffff)"));
        assert!(text.contains("not in asset: Nock"));
    }

    #[test]
    fn listing_mentions_every_slot() {
        let listing = panel().option_listing();
        for slot in ["fletch:", "vane_primary:", "vane_secondary:", "nock:", "wrap:"] {
            assert!(listing.contains(slot));
        }
    }
}
