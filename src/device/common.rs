// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Helpers shared by the plug and bulb adapters.
//!
//! Everything here is a pure function of a snapshot.

use crate::error::{SnapshotError, ValueError};
use crate::event::DeviceId;
use crate::property::PropertyValue;
use crate::vendor::{EnergySnapshot, SysInfo};

/// Derives the display name of a device or of one of its outlets.
///
/// Uses the outlet's alias when `outlet` is set, the device alias otherwise,
/// and falls back to the model when the alias is empty.
///
/// # Errors
///
/// Returns `SnapshotError::InvalidChild` if the outlet does not exist.
///
/// # Examples
///
/// ```
/// use aztech_adapter::device::derive_name;
/// use aztech_adapter::vendor::SysInfo;
///
/// let info = SysInfo {
///     model: "HS100(UK)".to_string(),
///     ..SysInfo::default()
/// };
/// assert_eq!(derive_name(&info, None).unwrap(), "HS100(UK)");
/// ```
pub fn derive_name(info: &SysInfo, outlet: Option<usize>) -> Result<String, SnapshotError> {
    let alias = match outlet {
        Some(index) => &info.child(index)?.alias,
        None => &info.alias,
    };

    if alias.is_empty() {
        Ok(info.model.clone())
    } else {
        Ok(alias.clone())
    }
}

/// Derives the stable gateway identifier of a device or outlet.
///
/// The vendor `deviceId` is preferred; devices that do not report one are
/// identified by MAC address.
///
/// # Errors
///
/// Returns `SnapshotError::MissingField` if the snapshot carries neither.
pub fn derive_id(
    prefix: &str,
    info: &SysInfo,
    outlet: Option<usize>,
) -> Result<DeviceId, SnapshotError> {
    let base = info
        .device_id
        .as_deref()
        .or(info.mac.as_deref())
        .ok_or(SnapshotError::MissingField("deviceId"))?;

    Ok(match outlet {
        Some(index) => DeviceId::new(format!("{prefix}-{base}-{index}")),
        None => DeviceId::new(format!("{prefix}-{base}")),
    })
}

/// Returns the power draw in watts, or `None` if the meter has no power reading.
#[must_use]
pub fn extract_power(energy: &EnergySnapshot) -> Option<f64> {
    base_or_milli(energy.power, energy.power_mw)
}

/// Returns the voltage in volts, or `None` if the meter has no voltage reading.
#[must_use]
pub fn extract_voltage(energy: &EnergySnapshot) -> Option<f64> {
    base_or_milli(energy.voltage, energy.voltage_mv)
}

/// Returns the current in amperes, or `None` if the meter has no current reading.
#[must_use]
pub fn extract_current(energy: &EnergySnapshot) -> Option<f64> {
    base_or_milli(energy.current, energy.current_ma)
}

fn base_or_milli(base: Option<f64>, milli: Option<f64>) -> Option<f64> {
    base.or_else(|| milli.map(|m| m / 1000.0))
}

/// Reads a boolean written by the gateway.
pub(crate) fn written_bool(property: &str, value: &PropertyValue) -> Result<bool, ValueError> {
    value.as_bool().ok_or_else(|| ValueError::TypeMismatch {
        property: property.to_string(),
        expected: "boolean",
    })
}

/// Reads an integer written by the gateway, narrowed to `T`.
pub(crate) fn written_int<T: TryFrom<i64>>(
    property: &str,
    value: &PropertyValue,
    min: T,
    max: T,
) -> Result<T, ValueError>
where
    i64: From<T>,
{
    let actual = value.as_i64().ok_or_else(|| ValueError::TypeMismatch {
        property: property.to_string(),
        expected: "integer",
    })?;
    T::try_from(actual).map_err(|_| ValueError::OutOfRange {
        min: i64::from(min),
        max: i64::from(max),
        actual,
    })
}
