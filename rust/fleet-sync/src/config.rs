/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Service configuration loaded from a TOML or JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable that overrides `geotab.password`.
pub const PASSWORD_ENV: &str = "FLEET_SYNC_GEOTAB_PASSWORD";

/// Longest accepted report window, one day.
pub const MAX_WINDOW_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeotabConfig {
    #[serde(default = "default_server")]
    pub server: String,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GeotabConfig {
    pub fn client_config(&self) -> fleet_rpc::ClientConfig {
        fleet_rpc::ClientConfig {
            server: self.server.clone(),
            database: self.database.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    /// Prefix for generated report filenames.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// IANA zone every report timestamp is rendered in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,
    /// Minimum spacing between address lookups.
    #[serde(default = "default_address_interval_ms")]
    pub address_interval_ms: u64,
    /// Upload directory, relative to the transfer root.
    #[serde(default)]
    pub remote_dir: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            timezone: default_timezone(),
            window_minutes: default_window_minutes(),
            address_interval_ms: default_address_interval_ms(),
            remote_dir: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_roster_path")]
    pub remote_path: String,
    /// Groups whose descendants may be added or removed on a device.
    #[serde(default)]
    pub managed_roots: Vec<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            remote_path: default_roster_path(),
            managed_roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub geotab: GeotabConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    pub transfer: TransferConfig,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_server() -> String {
    "my.geotab.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_prefix() -> String {
    "fleet".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

const fn default_window_minutes() -> i64 {
    60
}

const fn default_address_interval_ms() -> u64 {
    150
}

const fn default_enabled() -> bool {
    true
}

fn default_roster_path() -> String {
    "Export/geotab/fwgeotabinfo.csv".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    3600
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config = Self::parse(&content, ConfigFormat::from_path(path))?;
        config.apply_env_overrides(std::env::var(PASSWORD_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| Error::Config(format!("invalid {} config: {e}", format.as_str()))),
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| Error::Config(format!("invalid {} config: {e}", format.as_str()))),
        }
    }

    pub fn apply_env_overrides(&mut self, password: Option<String>) {
        if let Some(password) = password.filter(|p| !p.trim().is_empty()) {
            self.geotab.password = password;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.geotab.database.trim().is_empty() {
            return Err(Error::Config("geotab.database is required".into()));
        }
        if self.geotab.username.trim().is_empty() {
            return Err(Error::Config("geotab.username is required".into()));
        }
        if self.geotab.password.is_empty() {
            return Err(Error::Config(format!(
                "geotab.password is required (or set {PASSWORD_ENV})"
            )));
        }
        self.timezone()?;
        if !(1..=MAX_WINDOW_MINUTES).contains(&self.reports.window_minutes) {
            return Err(Error::Config(format!(
                "reports.window_minutes must be between 1 and {MAX_WINDOW_MINUTES}"
            )));
        }
        if self.poll_interval_secs < 60 {
            return Err(Error::Config(
                "poll_interval_secs must be at least 60 seconds".into(),
            ));
        }
        if self.roster.enabled && self.roster.managed_roots.is_empty() {
            return Err(Error::Config(
                "roster.managed_roots is required when roster sync is enabled".into(),
            ));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.reports.timezone.parse::<Tz>().map_err(|_| {
            Error::Config(format!("unknown timezone '{}'", self.reports.timezone))
        })
    }

    /// Report window length, clamped to the range `validate` accepts.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.reports.window_minutes.clamp(1, MAX_WINDOW_MINUTES))
    }

    pub fn address_interval(&self) -> Duration {
        Duration::from_millis(self.reports.address_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
