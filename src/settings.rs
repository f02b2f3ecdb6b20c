//! Viewer settings loaded from a JSON file.
//!
//! Every field has a default, so a partial file (or none at all) is fine.

use crate::config::Rgb;
use crate::scene::binder::NodeNames;
use std::path::{Path, PathBuf};

pub const DEFAULT_ASSET_URL: &str =
    "https://raw.githubusercontent.com/KhronosGroup/glTF-Sample-Models/master/2.0/Duck/glTF-Binary/Duck.glb";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Swatch {
    pub name: String,
    pub color: Rgb,
}

impl Swatch {
    fn new(name: &str, color: Rgb) -> Self {
        Self {
            name: name.to_string(),
            color,
        }
    }
}

/// Named colors offered by the controls. Presentation data only; the
/// configuration accepts any color.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Palette {
    pub vane: Vec<Swatch>,
    pub nock: Vec<Swatch>,
    pub wrap: Vec<Swatch>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            vane: vec![
                Swatch::new("Blaze Orange", Rgb::new(0xff, 0x6a, 0x00)),
                Swatch::new("White", Rgb::new(0xff, 0xff, 0xff)),
                Swatch::new("Flo Yellow", Rgb::new(0xe6, 0xff, 0x00)),
                Swatch::new("Red", Rgb::new(0xd0, 0x10, 0x1a)),
                Swatch::new("Black", Rgb::new(0x11, 0x11, 0x11)),
            ],
            nock: vec![
                Swatch::new("Flo Green", Rgb::new(0x39, 0xff, 0x14)),
                Swatch::new("Pink", Rgb::new(0xff, 0x3e, 0xa5)),
                Swatch::new("Clear", Rgb::new(0xe8, 0xe8, 0xe8)),
            ],
            wrap: vec![
                Swatch::new("Black", Rgb::new(0x11, 0x11, 0x11)),
                Swatch::new("White", Rgb::new(0xff, 0xff, 0xff)),
                Swatch::new("Camo Green", Rgb::new(0x4b, 0x5d, 0x3a)),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub asset_url: String,
    pub cache_dir: PathBuf,
    pub variant_id: String,
    pub parent_origin: String,
    pub node_names: NodeNames,
    /// Horizontal field of view, degrees.
    pub fov_deg: f32,
    /// Model spin about +Y, radians per second.
    pub auto_rotate_speed: f32,
    pub orbit_damping: f32,
    pub palette: Palette,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            asset_url: DEFAULT_ASSET_URL.to_string(),
            cache_dir: std::env::temp_dir().join("fletchkit-cache"),
            variant_id: String::new(),
            parent_origin: "https://dev.daysixgear.com".to_string(),
            node_names: NodeNames::default(),
            fov_deg: 45.0,
            auto_rotate_speed: 0.25,
            orbit_damping: 0.06,
            palette: Palette::default(),
        }
    }
}

impl ViewerSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Defaults when `path` is `None` or names a file that does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) if path.exists() => {
                let settings = Self::load(path)?;
                log::info!("Settings loaded from {}", path.display());
                Ok(settings)
            }
            Some(path) => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let json = r##"{ "variant_id": "4411", "node_names": { "nock": "NockGroup" } }"##;
        let settings: ViewerSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.variant_id, "4411");
        assert_eq!(settings.node_names.nock, "NockGroup");
        assert_eq!(settings.node_names.three_fletch, "Fletch_3");
        assert_eq!(settings.fov_deg, 45.0);
        assert_eq!(settings.palette, Palette::default());
    }

    #[test]
    fn missing_file_means_defaults() {
        let settings =
            ViewerSettings::load_or_default(Some(Path::new("/nonexistent/fletchkit.json"))).unwrap();
        assert_eq!(settings, ViewerSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!("fletchkit_settings_{}_{}.json", std::process::id(), nonce));
        std::fs::write(&path, "{ \"fov_deg\": \"wide\" }").unwrap();

        let err = ViewerSettings::load_or_default(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));

        let _ = std::fs::remove_file(path);
    }
}
