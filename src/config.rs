//! Settings for talking to the remote archives and writing files.

use crate::errors::SrsDataErr;
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Client configuration. Every field has a default, so an empty TOML file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the NOAA NGDC RSTN spectral archive.
    #[serde(default = "default_noaa_url")]
    pub noaa_url: String,
    /// Root of the World Data Centre spectrograph archive.
    #[serde(default = "default_wdc_url")]
    pub wdc_url: String,
    /// Timeout for each network request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replace files that already exist in the download directory.
    #[serde(default)]
    pub overwrite: bool,
    /// Sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_noaa_url() -> String {
    "https://www.ngdc.noaa.gov/stp/space-weather/solar-data/solar-features/solar-radio/rstn-spectral"
        .to_owned()
}

fn default_wdc_url() -> String {
    concat!(
        "https://www.sws.bom.gov.au/Category/World%20Data%20Centre/",
        "Data%20Display%20and%20Download/Spectrograph/station"
    )
    .to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            noaa_url: default_noaa_url(),
            wdc_url: default_wdc_url(),
            timeout_secs: default_timeout_secs(),
            overwrite: false,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &dyn AsRef<Path>) -> Result<Self, SrsDataErr> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SrsDataErr> {
        Ok(toml::from_str(text)?)
    }

    /// The per request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Same configuration with a different timeout.
    pub fn with_timeout(self, timeout_secs: u64) -> Self {
        Config {
            timeout_secs,
            ..self
        }
    }

    /// Same configuration with a different overwrite policy.
    pub fn with_overwrite(self, overwrite: bool) -> Self {
        Config { overwrite, ..self }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
