// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the adapter.
//!
//! Failures fall into three families:
//!
//! - [`VendorError`]: the vendor client could not talk to the device. These are
//!   transient; the poll loop skips the cycle and tries again.
//! - [`SnapshotError`]: the vendor client answered, but the snapshot lacks a
//!   field the adapter relies on. This aborts one poll cycle or one registration.
//! - [`ValueError`]: a value written by the gateway was rejected before any
//!   vendor call was made.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The vendor client failed to reach or command the device.
    #[error("vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// A vendor call did not complete within the configured fetch timeout.
    #[error("vendor call timed out after {0} ms")]
    Timeout(u64),

    /// A snapshot returned by the vendor client is malformed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// A property value was rejected.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The device has no property with this name.
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    /// The property cannot be written by the gateway.
    #[error("property {0} is read-only")]
    ReadOnly(String),

    /// Device was not found in the adapter.
    #[error("device not found")]
    DeviceNotFound,
}

impl Error {
    /// Returns `true` if the error is a communication failure that the next
    /// poll cycle may not see again.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Vendor(_) | Self::Timeout(_))
    }
}

/// Errors reported by a vendor client implementation.
#[derive(Debug, Error)]
pub enum VendorError {
    /// The device could not be reached.
    #[error("communication failed: {0}")]
    Communication(String),

    /// The device answered but refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The device payload could not be decoded.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised when a snapshot does not honour the vendor contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// A field the adapter depends on is missing.
    #[error("missing field in snapshot: {0}")]
    MissingField(&'static str),

    /// A child index does not exist in the snapshot's child list.
    #[error("child index {index} out of range (device has {len} children)")]
    InvalidChild {
        /// The requested child index.
        index: usize,
        /// Number of children in the snapshot.
        len: usize,
    },
}

/// Errors raised when validating a property value written by the gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value's JSON type does not match the property's declared type.
    #[error("expected a {expected} value for {property}")]
    TypeMismatch {
        /// The property name.
        property: String,
        /// The declared value type.
        expected: &'static str,
    },

    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A string value is not one of the property's enumerated values.
    #[error("value {0:?} is not an allowed choice")]
    NotInEnum(String),

    /// A color string is not a valid `#rrggbb` hex color.
    #[error("invalid hex color: {0}")]
    InvalidHexColor(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
