// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bulb color mode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rendering mode of a bulb that supports both color and tunable white.
///
/// The firmware has no explicit mode flag: a color temperature of zero means
/// the bulb is rendering an HSV color.
///
/// # Examples
///
/// ```
/// use aztech_adapter::types::ColorMode;
///
/// assert_eq!(ColorMode::from_color_temp(0), ColorMode::Color);
/// assert_eq!(ColorMode::from_color_temp(2700), ColorMode::Temperature);
/// assert_eq!(ColorMode::Temperature.as_str(), "temperature");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// The bulb renders an HSV color.
    Color,
    /// The bulb renders a white color temperature.
    Temperature,
}

impl ColorMode {
    /// All modes, in the order advertised to the gateway.
    pub const ALL: [Self; 2] = [Self::Color, Self::Temperature];

    /// Derives the mode from a color temperature reading in kelvin.
    #[must_use]
    pub const fn from_color_temp(kelvin: u16) -> Self {
        if kelvin == 0 {
            Self::Color
        } else {
            Self::Temperature
        }
    }

    /// Returns the gateway string for this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Temperature => "temperature",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
