// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AirPrintError, Result};

/// Settings for discovery, selection and IPP requests.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// mDNS service type browsed for printers.
    pub service_type: String,
    /// Resource path used when a printer's TXT record has no `rp` key.
    pub default_resource_path: String,
    /// Value of `requesting-user-name` on Print-Job requests.
    pub requesting_user_name: String,
    /// Upper bound for a single IPP round trip, in seconds.
    pub request_timeout_secs: u64,
    /// Drop a printer from the registry when mDNS reports it gone.
    pub evict_on_removal: bool,
    /// Select the first printer discovered when nothing is selected yet.
    pub auto_select_first: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_type: "_ipp._tcp.local.".into(),
            default_resource_path: "ipp/print".into(),
            requesting_user_name: "ipp-picture".into(),
            request_timeout_secs: 30,
            evict_on_removal: true,
            auto_select_first: true,
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.service_type.ends_with(".local.") {
            return Err(AirPrintError::Config(format!(
                "service type '{}' must end in '.local.'",
                self.service_type
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(AirPrintError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
