//! # Colours
//!
//! 24-bit RGB colours as used by class definitions and annotation overlays.
//! Colours are exchanged as hex strings (`#rrggbb`) in text files and as packed
//! `0xRRGGBB` integers in memory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur while parsing a colour
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// Wrong number of hex digits
    #[error("Invalid hex colour length ({len} digits): {value}")]
    InvalidLength {
        /// The offending input
        value: String,
        /// Number of digits after the optional `#`
        len: usize,
    },

    /// Non-hex character in the input
    #[error("Invalid hex digit in colour: {0}")]
    InvalidDigit(String),

    /// Packed value does not fit into 24 bits
    #[error("Colour value out of 24-bit range: {0:#x}")]
    OutOfRange(u32),
}

/// An 8-bit-per-channel RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Pure black
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    /// Pure white
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Create a colour from its channels
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb` or the short form `#rgb` (case-insensitive)
    pub fn from_hex(value: &str) -> Result<Self, ColorError> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidDigit(value.to_string()));
        }

        match digits.len() {
            6 => {
                let packed = u32::from_str_radix(digits, 16)
                    .map_err(|_| ColorError::InvalidDigit(value.to_string()))?;
                Ok(Self::from(packed))
            }
            3 => {
                // Each nibble is doubled: #f0a == #ff00aa
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(digits.chars()) {
                    let nibble = c.to_digit(16).unwrap_or(0) as u8;
                    *slot = nibble << 4 | nibble;
                }
                Ok(Self::new(channels[0], channels[1], channels[2]))
            }
            len => Err(ColorError::InvalidLength {
                value: value.to_string(),
                len,
            }),
        }
    }

    /// Lowercase `#rrggbb` representation
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Packed `0xRRGGBB` value
    pub fn to_u32(&self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Build from a packed value, rejecting anything above `0xFFFFFF`
    pub fn try_from_u32(value: u32) -> Result<Self, ColorError> {
        if value > 0x00FF_FFFF {
            return Err(ColorError::OutOfRange(value));
        }
        Ok(Self::from(value))
    }

    /// Channels scaled to `0.0..=1.0`
    pub fn to_unit(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Packed `0xRRGGBB`; bits above 24 are ignored
impl From<u32> for Rgb {
    fn from(value: u32) -> Self {
        Self {
            r: (value >> 16 & 0xFF) as u8,
            g: (value >> 8 & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
