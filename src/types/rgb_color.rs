// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with HSV conversion and hex formatting.
//!
//! Bulbs report their color as hue (0-359), saturation (0-100) and a
//! brightness percentage, while the gateway exchanges colors as `#rrggbb`
//! strings. This module converts between the two.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use aztech_adapter::types::RgbColor;
///
/// let green = RgbColor::from_hsv(120, 100, 255);
/// assert_eq!(green.to_hex(), "#00ff00");
///
/// let parsed = RgbColor::from_hex("#FF8000").unwrap();
/// assert_eq!(parsed, RgbColor::new(255, 128, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

/// A hue/saturation/brightness triple in the units the bulb firmware uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsv {
    /// Hue in degrees (0-359).
    pub hue: u16,
    /// Saturation percentage (0-100).
    pub saturation: u8,
    /// Brightness percentage (0-100).
    pub brightness: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Converts an HSV triple to RGB.
    ///
    /// `hue` is in degrees `[0, 360)`, `saturation` in `[0, 100]` and `value`
    /// in `[0, 255]`. Callers are responsible for staying inside these ranges:
    /// out-of-range input is not rejected and yields a deterministic but
    /// meaningless color (hues wrap every 360 degrees, channels saturate at
    /// 0 and 255).
    #[must_use]
    pub fn from_hsv(hue: u16, saturation: u8, value: u8) -> Self {
        let (red, green, blue) = hsv_to_rgb(hue, saturation, value);
        Self::new(red, green, blue)
    }

    /// Parses a color from a hex string.
    ///
    /// Accepts `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`, in either case.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHexColor` if the string is not a hex color.
    pub fn from_hex(hex: &str) -> Result<Self, ValueError> {
        let digits = hex.trim_start_matches('#');
        let invalid = || ValueError::InvalidHexColor(hex.to_string());

        if !digits.is_ascii() {
            return Err(invalid());
        }

        match digits.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, c) in channels.iter_mut().zip(digits.chars()) {
                    let nibble = c
                        .to_digit(16)
                        .and_then(|d| u8::try_from(d).ok())
                        .ok_or_else(invalid)?;
                    *slot = nibble * 17;
                }
                Ok(Self::new(channels[0], channels[1], channels[2]))
            }
            6 => {
                let pair = |range: std::ops::Range<usize>| {
                    u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
                };
                Ok(Self::new(pair(0..2)?, pair(2..4)?, pair(4..6)?))
            }
            _ => Err(invalid()),
        }
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the color as a lowercase `#rrggbb` string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Converts this color to the firmware's HSV representation.
    ///
    /// Rounding makes the conversion lossy: converting back with
    /// [`from_hsv`](Self::from_hsv) may differ by a step per channel.
    #[must_use]
    pub fn to_hsv(&self) -> Hsv {
        let (hue, saturation, brightness) = rgb_to_hsv(self.red, self.green, self.blue);
        Hsv {
            hue,
            saturation,
            brightness,
        }
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Converts an HSV triple straight to a `#rrggbb` string.
///
/// See [`RgbColor::from_hsv`] for the accepted ranges.
///
/// # Examples
///
/// ```
/// use aztech_adapter::types::hsv_to_hex;
///
/// assert_eq!(hsv_to_hex(0, 100, 255), "#ff0000");
/// assert_eq!(hsv_to_hex(0, 0, 0), "#000000");
/// ```
#[must_use]
pub fn hsv_to_hex(hue: u16, saturation: u8, value: u8) -> String {
    RgbColor::from_hsv(hue, saturation, value).to_hex()
}

/// Sector-based HSV to RGB conversion.
///
/// Takes (hue: 0-360, saturation: 0-100, value: 0-255).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn hsv_to_rgb(hue: u16, saturation: u8, value: u8) -> (u8, u8, u8) {
    let h = f64::from(hue) / 60.0;
    let s = f64::from(saturation) / 100.0;
    let v = f64::from(value) / 255.0;

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (sector as u32) % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    // Float-to-int casts saturate, which keeps out-of-range input in [0, 255].
    let channel = |x: f64| (x * 255.0).round() as u8;
    (channel(r), channel(g), channel(b))
}

/// Converts RGB values to HSV.
///
/// Returns (hue: 0-359, saturation: 0-100, brightness: 0-100).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u16, u8, u8) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let brightness = (max * 100.0).round() as u8;

    let saturation = if max == 0.0 {
        0
    } else {
        ((delta / max) * 100.0).round() as u8
    };

    let hue = if delta < f64::EPSILON {
        0.0
    } else if (max - r).abs() < f64::EPSILON {
        (60.0 * ((g - b) / delta)).rem_euclid(360.0)
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    ((hue.round() as u16) % 360, saturation, brightness)
}
