//! Find and download SRS files from the public archives.

use crate::{
    config::Config,
    errors::SrsDataErr,
    remote::{HttpRemote, RemoteSource},
    site::Site,
};
use std::{fmt, str::FromStr};
use strum::IntoEnumIterator;

mod availability;
mod download;

/// Which sites a request covers.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SiteSelection {
    /// Every site in the network.
    #[default]
    All,
    /// Only these sites.
    Only(Vec<Site>),
}

impl SiteSelection {
    /// The selected sites, sorted and without duplicates.
    pub fn sites(&self) -> Vec<Site> {
        match self {
            SiteSelection::All => Site::iter().collect(),
            SiteSelection::Only(sites) => {
                let mut sites = sites.clone();
                sites.sort();
                sites.dedup();
                sites
            }
        }
    }

    /// True if sites were named explicitly.
    pub fn is_explicit(&self) -> bool {
        matches!(self, SiteSelection::Only(_))
    }
}

impl FromStr for SiteSelection {
    type Err = SrsDataErr;

    /// Parse `"all"` or a comma separated list of site names.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.trim().eq_ignore_ascii_case("all") {
            return Ok(SiteSelection::All);
        }

        text.split(',')
            .filter(|name| !name.trim().is_empty())
            .map(Site::lookup)
            .collect::<Result<Vec<_>, _>>()
            .and_then(|sites| {
                if sites.is_empty() {
                    Err(SrsDataErr::UnknownSite(text.to_owned()))
                } else {
                    Ok(SiteSelection::Only(sites))
                }
            })
    }
}

impl From<Site> for SiteSelection {
    fn from(site: Site) -> Self {
        SiteSelection::Only(vec![site])
    }
}

impl From<Vec<Site>> for SiteSelection {
    fn from(sites: Vec<Site>) -> Self {
        SiteSelection::Only(sites)
    }
}

impl fmt::Display for SiteSelection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SiteSelection::All => write!(f, "all sites"),
            SiteSelection::Only(sites) => {
                let names: Vec<&str> = sites.iter().map(|site| site.name()).collect();
                write!(f, "{}", names.join(", "))
            }
        }
    }
}

/// Talks to the NOAA and WDC archives through a `RemoteSource`.
///
/// A client holds no state beyond its configuration, so every call goes to the network.
#[derive(Debug)]
pub struct Client<R = HttpRemote> {
    remote: R,
    config: Config,
}

impl Client<HttpRemote> {
    /// A client using HTTP.
    pub fn new(config: Config) -> Result<Self, SrsDataErr> {
        let remote = HttpRemote::new(&config)?;
        Ok(Client { remote, config })
    }
}

impl<R: RemoteSource> Client<R> {
    /// A client using any remote source.
    pub fn with_remote(remote: R, config: Config) -> Self {
        Client { remote, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
pub(crate) mod unit {
    use super::*;
    use crate::{
        remote::memory::MemoryRemote,
        srs::unit::{make_spectrogram, morning},
    };
    use chrono::NaiveDate;

    pub(crate) const NOAA: &str = "https://noaa.test/rstn";
    pub(crate) const WDC: &str = "https://wdc.test/station";

    pub(crate) fn test_config() -> Config {
        Config {
            noaa_url: NOAA.to_owned(),
            wdc_url: WDC.to_owned(),
            ..Config::default()
        }
    }

    pub(crate) fn jan_10() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    /// Uncompressed records for a site and day.
    pub(crate) fn srs_bytes(site: Site, date: NaiveDate) -> Vec<u8> {
        make_spectrogram(site, morning(date), 20, 3).to_bytes()
    }

    /// San Vito gzip'd at NOAA, Learmonth plain at the WDC.
    pub(crate) fn test_remote() -> MemoryRemote {
        let sv = crate::srs::gzip(&srs_bytes(Site::SanVito, jan_10())).unwrap();
        let lm = srs_bytes(Site::Learmonth, jan_10());

        MemoryRemote::default()
            .with_file(&format!("{}/san-vito/2025/01/sv250110.SRS.gz", NOAA), sv)
            .with_file(&format!("{}/learmonth/raw/25/LM250110.srs", WDC), lm)
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(SiteSelection::from_str("all").unwrap(), SiteSelection::All);
        assert_eq!(SiteSelection::from_str(" ALL ").unwrap(), SiteSelection::All);
        assert_eq!(
            SiteSelection::from_str("San Vito").unwrap(),
            SiteSelection::from(Site::SanVito)
        );
        assert_eq!(
            SiteSelection::from_str("learmonth, san-vito").unwrap(),
            SiteSelection::Only(vec![Site::Learmonth, Site::SanVito])
        );
    }

    #[test]
    fn test_parse_unknown_site() {
        let err = SiteSelection::from_str("San Vito,Atlantis").unwrap_err();
        assert!(err.is_not_found());
        assert!(SiteSelection::from_str(",").unwrap_err().is_not_found());
    }

    #[test]
    fn test_selection_sites() {
        assert_eq!(SiteSelection::All.sites().len(), 5);

        let sel = SiteSelection::Only(vec![Site::SanVito, Site::Holloman, Site::SanVito]);
        assert_eq!(sel.sites(), vec![Site::Holloman, Site::SanVito]);
        assert!(sel.is_explicit());
        assert_eq!(
            SiteSelection::from(vec![Site::Holloman, Site::SanVito]).to_string(),
            "Holloman, San Vito"
        );
    }
}
