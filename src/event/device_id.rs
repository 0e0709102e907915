// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a device registered with the gateway.
///
/// Identifiers are derived from the vendor device id (see
/// [`derive_id`](crate::device::derive_id)) so that a plug keeps its identity
/// across gateway restarts. Each outlet of a strip gets its own identifier.
///
/// # Examples
///
/// ```
/// use aztech_adapter::event::DeviceId;
///
/// let id = DeviceId::new("aztech-8006F2-1");
/// assert_eq!(id.as_str(), "aztech-8006F2-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates an identifier from its string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let id = DeviceId::new("aztech-80067B-0");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"aztech-80067B-0\"");
    }

    #[test]
    fn hashable() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(DeviceId::from("a"));
        assert!(set.contains(&DeviceId::new("a")));
    }
}
