// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the plug and bulb adapters.
//!
//! - [`RgbColor`] - 8-bit RGB color with HSV conversion and `#rrggbb` formatting
//! - [`Hsv`] - Hue/saturation/brightness triple as the vendor firmware speaks it
//! - [`ColorMode`] - Whether a bulb currently renders a color or a white temperature

mod color_mode;
mod rgb_color;

pub use color_mode::ColorMode;
pub use rgb_color::{Hsv, RgbColor, hsv_to_hex};
