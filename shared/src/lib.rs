use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

mod draft_format;

pub use draft_format::{
    decode_draft_file, encode_draft_file, parse_draft, DraftError, MaskDraft, DRAFT_FILE_MAGIC,
    DRAFT_FILE_VERSION,
};

pub const MAX_DISPLAY_WIDTH: u32 = 800;
pub const MIN_STROKE_WIDTH: u32 = 1;
pub const MAX_STROKE_WIDTH: u32 = 50;
pub const DEFAULT_STROKE_WIDTH: u32 = 12;

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn scale(self, sx: f32, sy: f32) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }
}

/// Pixel dimensions of an image or drawing surface.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Size an image for display: images wider than `max_width` are scaled down
/// to exactly `max_width`, keeping the aspect ratio. Narrower images are
/// displayed at their natural size.
pub fn fit_display(natural: Dimensions, max_width: u32) -> Dimensions {
    if max_width == 0 || natural.width <= max_width {
        return natural;
    }
    let scale = max_width as f64 / natural.width as f64;
    let height = (natural.height as f64 * scale).round().max(1.0) as u32;
    Dimensions {
        width: max_width,
        height,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid color: {0:?}")]
pub struct ColorParseError(pub String);

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const RED: Color = Color::rgb(0xff, 0x00, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0xff, 0x00);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xff);
    pub const YELLOW: Color = Color::rgb(0xff, 0xff, 0x00);
    pub const MAGENTA: Color = Color::rgb(0xff, 0x00, 0xff);
    pub const CYAN: Color = Color::rgb(0x00, 0xff, 0xff);
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                self.r, self.g, self.b, self.a
            )
        }
    }

    pub fn to_rgba_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f32 / 255.0
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorParseError(value.to_string());
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |index: usize| u8::from_str_radix(&hex[index..index + 2], 16);
        let short = |index: usize| {
            u8::from_str_radix(&hex[index..index + 1], 16).map(|value| value * 0x11)
        };
        let parsed = match hex.len() {
            3 => (short(0), short(1), short(2), Ok(0xff)),
            6 => (channel(0), channel(2), channel(4), Ok(0xff)),
            8 => (channel(0), channel(2), channel(4), channel(6)),
            _ => return Err(invalid()),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Color { r, g, b, a }),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The fixed brush swatches offered next to the free color picker.
pub const SWATCHES: [Color; 8] = [
    Color::BLACK,
    Color::RED,
    Color::GREEN,
    Color::BLUE,
    Color::YELLOW,
    Color::MAGENTA,
    Color::CYAN,
    Color::WHITE,
];

pub fn clamp_stroke_width(width: u32) -> u32 {
    width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushSettings {
    pub color: Color,
    pub width: u32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: DEFAULT_STROKE_WIDTH,
        }
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: u32,
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(brush: BrushSettings, start: Point) -> Self {
        Self {
            color: brush.color,
            width: clamp_stroke_width(brush.width),
            points: vec![start],
        }
    }
}

/// A stored original/mask pair as listed by the backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImagePair {
    pub id: i64,
    pub original_url: String,
    pub mask_url: String,
    pub created_at: String,
}

impl ImagePair {
    /// Parses `created_at`, accepting RFC 3339 as well as the
    /// `YYYY-MM-DD HH:MM:SS` form SQLite timestamps come back in.
    pub fn created(&self) -> Option<NaiveDateTime> {
        let raw = self.created_at.trim();
        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Some(value.naive_utc());
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    pub fn created_label(&self) -> String {
        self.created()
            .map(|value| value.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| self.created_at.clone())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    pub original_image: String,
    pub mask_image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadResponse {
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub mask_url: Option<String>,
}
