//! Configuration persistence for colorpatch settings

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque color identifier shared between the source and reference canvases.
///
/// Stored as a 24-bit RGB value. It is used purely as a correlation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ColorToken(u32);

impl ColorToken {
    pub const RED: ColorToken = ColorToken::from_rgb(255, 0, 0);
    pub const GREEN: ColorToken = ColorToken::from_rgb(0, 255, 0);
    pub const BLUE: ColorToken = ColorToken::from_rgb(0, 0, 255);
    pub const YELLOW: ColorToken = ColorToken::from_rgb(255, 255, 0);
    pub const MAGENTA: ColorToken = ColorToken::from_rgb(255, 0, 255);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Lower-case hex without the leading `#`, used in mask filenames
    pub fn hex(self) -> String {
        format!("{:06x}", self.0)
    }

    /// Identifier sent to the processor in pair metadata (`#rrggbb`)
    pub fn id(self) -> String {
        format!("#{}", self.hex())
    }

    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self)
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl From<ColorToken> for String {
    fn from(c: ColorToken) -> Self {
        c.id()
    }
}

impl TryFrom<String> for ColorToken {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ColorToken::parse(&s).ok_or_else(|| format!("invalid color token: {s}"))
    }
}

/// Correction strategy requested by the user for one color pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodChoice {
    /// Let the patch classifier decide at submission time
    #[default]
    Auto,
    /// Geometry-preserving warp
    Extract,
    /// AI re-synthesis
    Generate,
}

/// Session color palette.
///
/// Snapshots are immutable: adding or removing a color yields a new palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<ColorToken>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                ColorToken::RED,
                ColorToken::GREEN,
                ColorToken::BLUE,
                ColorToken::YELLOW,
                ColorToken::MAGENTA,
            ],
        }
    }
}

impl Palette {
    pub fn colors(&self) -> &[ColorToken] {
        &self.colors
    }

    pub fn contains(&self, color: ColorToken) -> bool {
        self.colors.contains(&color)
    }

    /// New snapshot with `color` appended (unchanged if already present)
    #[must_use]
    pub fn with_color(&self, color: ColorToken) -> Palette {
        let mut colors = self.colors.clone();
        if !colors.contains(&color) {
            colors.push(color);
        }
        Palette { colors }
    }

    /// New snapshot without `color`
    #[must_use]
    pub fn without_color(&self, color: ColorToken) -> Palette {
        Palette {
            colors: self.colors.iter().copied().filter(|c| *c != color).collect(),
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the external processor (`/process` is appended)
    pub worker_url: String,
    /// Brush width in on-screen placement pixels
    pub brush_width: f32,
    /// Margin added around each mask bounding box, in native pixels
    pub bbox_padding: u32,
    /// Zoom bounds
    pub min_scale: f32,
    pub max_scale: f32,
    /// Scale change per wheel delta unit
    pub zoom_sensitivity: f32,
    /// Ask the processor to keep the source canvas size
    pub enforce_fixed_canvas: bool,
    /// Ask the processor to apply pairs one after another on a working canvas
    pub sequential: bool,
    /// Whether auto routing may shell out to tesseract
    pub ocr_enabled: bool,
    /// Method assigned to newly paired colors
    pub default_method: MethodChoice,
    pub palette: Palette,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            worker_url: "http://127.0.0.1:8787".to_string(),
            brush_width: 20.0,
            bbox_padding: 10,
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_sensitivity: 0.001,
            enforce_fixed_canvas: true,
            sequential: true,
            ocr_enabled: true,
            default_method: MethodChoice::Auto,
            palette: Palette::default(),
        }
    }
}

impl AppConfig {
    /// Directory name under the user config dir
    pub const ID: &'static str = "colorpatch";

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("Could not determine config directory, using defaults");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not read config {}: {:?}", path.display(), err);
                }
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) {
        match Self::default_path() {
            Some(path) => self.save_to(&path),
            None => log::error!("Could not determine config directory for saving"),
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent()
            && let Err(err) = std::fs::create_dir_all(parent)
        {
            log::error!("Could not create config directory: {:?}", err);
            return;
        }
        match serde_json::to_string_pretty(self) {
            Ok(text) => {
                if let Err(err) = std::fs::write(path, text) {
                    log::error!("Failed to save config: {:?}", err);
                }
            }
            Err(err) => log::error!("Failed to serialize config: {:?}", err),
        }
    }

    /// Endpoint that receives the multipart submission
    pub fn process_url(&self) -> String {
        format!("{}/process", self.worker_url.trim_end_matches('/'))
    }
}
